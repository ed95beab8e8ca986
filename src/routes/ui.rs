use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>DocQuery - Ask Questions About Your Documents</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 0; color: #3a3a3a; background: #f0f2f6; display: flex; min-height: 100vh; }
    aside { width: 280px; padding: 1.5rem; background: #fff; border-right: 1px solid rgba(49, 51, 63, 0.2); }
    main { flex: 1; padding: 2rem; }
    h1 { text-align: center; font-family: Georgia, serif; }
    .intro { text-align: center; }
    .columns { display: flex; gap: 1rem; }
    .card { flex: 1; background: #fff; border: 1px solid rgba(49, 51, 63, 0.2); padding: 1rem; border-radius: 0.5rem; margin-bottom: 1rem; }
    label { display: block; margin-top: 0.75rem; font-weight: 600; }
    input, textarea { width: 100%; padding: 0.5rem; box-sizing: border-box; }
    textarea { min-height: 6rem; }
    button { margin-top: 1rem; padding: 0.6rem 1rem; }
    .notice { padding: 0.75rem; border-radius: 0.5rem; margin-bottom: 1rem; }
    .warning { background: #fff4e5; }
    .error { background: #fdecea; color: #8a1c1c; }
    .hidden { display: none; }
    #answer { white-space: pre-wrap; min-height: 2rem; }
  </style>
</head>
<body>
  <aside>
    <h2>API Configuration</h2>
    <p>To use this app, you need to provide an OpenAI API key.</p>
    <label for="apiKey">API key</label>
    <input id="apiKey" type="password" autocomplete="off" />
    <hr />
    <p>Your API key is only sent with your question and is not stored.</p>
  </aside>

  <main>
    <h1>DocQuery: Ask Questions About Your Documents</h1>
    <p class="intro">Upload a document, ask a question, and get the answer streamed back. Supports .txt, .md, .pdf, and .csv files.</p>

    <div id="keyWarning" class="notice warning">Please enter your API key in the sidebar to proceed.</div>

    <div class="columns">
      <div class="card">
        <h3>1. Upload Your Document</h3>
        <input id="fileInput" type="file" accept=".txt,.md,.pdf,.csv" />
      </div>
      <div class="card">
        <h3>2. Ask a Question</h3>
        <textarea id="question" placeholder="e.g., Can you give me a short summary of this document?" disabled></textarea>
        <button id="askBtn" disabled>Ask</button>
      </div>
    </div>

    <div id="status" class="hidden">Analyzing document and generating answer...</div>
    <div id="errorBox" class="notice error hidden"></div>

    <div id="answerCard" class="card hidden">
      <h3>Answer</h3>
      <div id="answer"></div>
    </div>
  </main>

  <script>
    const apiKey = document.getElementById('apiKey');
    const fileInput = document.getElementById('fileInput');
    const question = document.getElementById('question');
    const askBtn = document.getElementById('askBtn');
    const keyWarning = document.getElementById('keyWarning');
    const statusBox = document.getElementById('status');
    const errorBox = document.getElementById('errorBox');
    const answerCard = document.getElementById('answerCard');
    const answer = document.getElementById('answer');
    let controller = null;

    function refresh() {
      const hasKey = apiKey.value.trim().length > 0;
      const hasFile = fileInput.files.length > 0;
      keyWarning.classList.toggle('hidden', hasKey);
      question.disabled = !hasFile;
      askBtn.disabled = !(hasKey && hasFile && question.value.trim());
    }

    function showError(message) {
      errorBox.textContent = message;
      errorBox.classList.remove('hidden');
    }

    function handleEvent(raw) {
      let name = 'message';
      const data = [];
      for (const line of raw.split('\n')) {
        if (line.startsWith('event:')) name = line.slice(6).trim();
        else if (line.startsWith('data:')) data.push(line.slice(5).replace(/^ /, ''));
      }
      if (name === 'chunk') {
        answer.textContent += JSON.parse(data.join('\n')).content;
      } else if (name === 'error') {
        showError(JSON.parse(data.join('\n')).error);
      }
    }

    async function ask() {
      if (controller) controller.abort();
      controller = new AbortController();

      errorBox.classList.add('hidden');
      answer.textContent = '';
      answerCard.classList.add('hidden');
      statusBox.classList.remove('hidden');

      const form = new FormData();
      form.append('api_key', apiKey.value);
      form.append('question', question.value);
      form.append('file', fileInput.files[0]);

      try {
        const res = await fetch('/api/ask', { method: 'POST', body: form, signal: controller.signal });
        if (!res.ok) {
          const json = await res.json().catch(() => ({ error: res.statusText }));
          showError(json.error);
          return;
        }

        answerCard.classList.remove('hidden');
        const reader = res.body.getReader();
        const decoder = new TextDecoder();
        let buffer = '';
        for (;;) {
          const { value, done } = await reader.read();
          if (done) break;
          buffer += decoder.decode(value, { stream: true }).replace(/\r\n/g, '\n');
          let split;
          while ((split = buffer.indexOf('\n\n')) >= 0) {
            handleEvent(buffer.slice(0, split));
            buffer = buffer.slice(split + 2);
          }
        }
      } catch (err) {
        if (err.name !== 'AbortError') showError(String(err));
      } finally {
        statusBox.classList.add('hidden');
      }
    }

    apiKey.addEventListener('input', refresh);
    fileInput.addEventListener('change', refresh);
    question.addEventListener('input', refresh);
    askBtn.addEventListener('click', ask);
    refresh();
  </script>
</body>
</html>"#)
}
