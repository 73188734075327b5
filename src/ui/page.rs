//! The chat page.

use super::messages::{render_log, typing_indicator};
use crate::document::accept_attribute;
use crate::session::Message;

const CHAT_STYLE: &str = r"
body { background: #f0f2f5; min-height: 100vh; margin: 0; display: flex; justify-content: center; align-items: center; font-family: system-ui, sans-serif; }
.card { background: #fff; padding: 25px; border-radius: 15px; box-shadow: 0 4px 20px rgba(0,0,0,0.1); width: 100%; max-width: 600px; display: flex; flex-direction: column; }
.title { font-size: 28px; font-weight: bold; margin: 0 0 8px; text-align: center; color: #007acc; }
.subheading { font-size: 16px; color: #555; margin: 0 0 15px; text-align: center; line-height: 1.5; font-weight: normal; }
#chat-box { min-height: 300px; max-height: 400px; overflow-y: auto; padding: 10px; background: #f9f9f9; border-radius: 10px; margin-bottom: 15px; display: flex; flex-direction: column; gap: 10px; }
#chat-log { display: flex; flex-direction: column; gap: 10px; }
.message { padding: 10px 15px; border-radius: 10px; max-width: 80%; font-size: 15px; line-height: 1.4; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
.message.user { align-self: flex-end; background: #DCF8C6; }
.message.bot { align-self: flex-start; background: #E8EAF6; }
.input-section { display: flex; gap: 10px; align-items: center; }
#question { flex: 1; padding: 10px; border-radius: 8px; border: 1px solid #ccc; font-size: 16px; }
#send { background: #007acc; color: #fff; border: none; border-radius: 8px; padding: 10px 15px; cursor: pointer; font-size: 16px; }
.upload { background: green; color: #fff; border-radius: 50%; padding: 10px; cursor: pointer; font-size: 18px; }
";

const CHAT_SCRIPT: &str = r"
const box = document.getElementById('chat-box');
const log = document.getElementById('chat-log');
const typing = document.getElementById('typing');
const input = document.getElementById('question');
const picker = document.getElementById('file-upload');
const scrollToEnd = () => box.scrollTo(0, box.scrollHeight);

const events = new EventSource('/chat/events');
events.addEventListener('message', (e) => {
  log.insertAdjacentHTML('beforeend', e.data);
  scrollToEnd();
});
events.addEventListener('pending', (e) => {
  typing.hidden = e.data !== 'true';
  scrollToEnd();
});
events.addEventListener('snapshot', (e) => {
  log.innerHTML = e.data;
  scrollToEnd();
});

async function ask() {
  const question = input.value;
  if (!question.trim() || !typing.hidden) return;
  input.value = '';
  try {
    await fetch('/chat/ask', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ question }),
    });
  } catch (err) {
    console.error(err);
  }
}

document.getElementById('send').addEventListener('click', ask);
input.addEventListener('keydown', (e) => { if (e.key === 'Enter') ask(); });

picker.addEventListener('change', async () => {
  const file = picker.files[0];
  if (!file) return;
  const form = new FormData();
  form.append('file', file);
  picker.value = '';
  try {
    await fetch('/chat/upload', { method: 'POST', body: form });
  } catch (err) {
    console.error(err);
  }
});

scrollToEnd();
";

/// Generate the HTML shell for the application.
pub fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>{CHAT_STYLE}</style>
</head>
<body>
{content}
</body>
</html>"#
    )
}

/// Full chat page with the current log pre-rendered.
pub fn chat_page(messages: &[Message], pending: bool) -> String {
    let content = format!(
        r#"
    <div class="card">
        <h1 class="title">🤖 AllyBot</h1>
        <h2 class="subheading">Got a document or a question? <br /> Let's simplify it together.</h2>

        <div id="chat-box">
            <div id="chat-log">{log}</div>
            {typing}
        </div>

        <div class="input-section">
            <input id="question" type="text" placeholder="Ask a question..." autocomplete="off" />
            <button id="send" type="button" aria-label="Send">➤</button>
            <label for="file-upload" class="upload" aria-label="Upload document">📂</label>
            <input id="file-upload" type="file" accept="{accept}" style="display: none" />
        </div>
    </div>
    <script>{CHAT_SCRIPT}</script>
"#,
        log = render_log(messages),
        typing = typing_indicator(pending),
        accept = accept_attribute(),
    );
    html_shell("AllyBot", &content)
}
