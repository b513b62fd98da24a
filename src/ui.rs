use crate::models::JournalView;

pub fn render_index(view: &JournalView) -> String {
    // `<` is escaped so stored notes can never close the script tag.
    let state = serde_json::to_string(view)
        .unwrap_or_else(|_| "null".into())
        .replace('<', "\\u003c");
    INDEX_HTML
        .replace("{{DATE_LABEL}}", &escape_html(&view.date_label))
        .replace("{{DATE}}", &escape_html(&view.selected_date))
        .replace("{{STATE}}", &state)
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Food Journal</title>
  <style>
    :root {
      --bg: #f7f4ee;
      --ink: #2b2a28;
      --muted: #6f6a62;
      --accent: #3f7d58;
      --danger: #b5483a;
      --card: #ffffff;
      --line: #e4ddd1;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 24px 16px 48px;
    }

    .app {
      max-width: 920px;
      margin: 0 auto;
      display: grid;
      gap: 18px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: center;
      justify-content: space-between;
    }

    h1 {
      margin: 0;
      font-size: 1.6rem;
    }

    section {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 16px 18px;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.1rem;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.95rem;
    }

    th, td {
      text-align: left;
      padding: 6px 8px;
      border-bottom: 1px solid var(--line);
    }

    form.entry {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
      margin-top: 12px;
    }

    input, textarea, button {
      font: inherit;
      padding: 6px 10px;
      border-radius: 8px;
      border: 1px solid var(--line);
    }

    input[type="number"] {
      width: 6rem;
    }

    textarea {
      width: 100%;
      min-height: 90px;
    }

    button {
      cursor: pointer;
      background: var(--accent);
      color: #fff;
      border: none;
    }

    button.ghost {
      background: transparent;
      color: var(--ink);
      border: 1px solid var(--line);
    }

    button.delete {
      background: transparent;
      color: var(--danger);
      padding: 2px 8px;
    }

    .pips {
      display: flex;
      gap: 8px;
    }

    .pip {
      width: 34px;
      height: 34px;
      border-radius: 50%;
      background: var(--line);
    }

    .pip.full {
      background: #4a90c2;
    }

    .banner {
      padding: 10px 14px;
      border-radius: 10px;
      background: #fff4d6;
      display: none;
    }

    .banner.show {
      display: block;
    }

    .overlay {
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.5);
      display: none;
      align-items: center;
      justify-content: center;
      padding: 24px;
    }

    .overlay.show {
      display: flex;
    }

    .overlay .panel {
      background: var(--card);
      border-radius: 14px;
      padding: 18px;
      width: min(860px, 100%);
      max-height: 90vh;
      overflow: auto;
    }

    .overlay textarea {
      font-family: monospace;
      min-height: 160px;
    }

    .hidden {
      display: none;
    }

    @media print {
      header .controls, form.entry, button, .overlay {
        display: none !important;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1 id="date-label">{{DATE_LABEL}}</h1>
      <div class="controls">
        <input id="date-picker" type="date" value="{{DATE}}" />
        <button id="today" class="ghost" type="button">Today</button>
        <button id="view-journal" class="ghost" type="button">Journal</button>
        <button id="view-history" class="ghost" type="button">History</button>
        <button id="print" class="ghost" type="button">Print</button>
        <button id="recovery-open" class="ghost" type="button">Recovery</button>
      </div>
    </header>

    <div id="rollover" class="banner">The date has changed since this page was loaded. Press Today to start the new day.</div>

    <div id="journal-view">
      <section>
        <h2>Plan</h2>
        <label>Protein goal <input id="protein-goal" type="text" /></label>
        <label><input id="ketosis" type="checkbox" /> Ketosis</label>
        <label><input id="followed-plan" type="checkbox" /> Followed plan</label>
      </section>

      <section>
        <h2>Water</h2>
        <div id="water" class="pips"></div>
      </section>

      <section>
        <h2>Meals</h2>
        <table><tbody id="meals"></tbody></table>
        <form class="entry" data-kind="meals">
          <input name="source" placeholder="Food" />
          <input name="time" type="time" />
          <input name="serving" placeholder="Serving" />
          <input name="calories" type="number" placeholder="Calories" />
          <input name="hungerBefore" type="number" placeholder="Hunger before" />
          <input name="hungerAfter" type="number" placeholder="Hunger after" />
          <button type="submit">Add</button>
        </form>
      </section>

      <section>
        <h2>Misc</h2>
        <table><tbody id="misc"></tbody></table>
        <form class="entry" data-kind="misc">
          <input name="source" placeholder="Item" />
          <input name="time" type="time" />
          <input name="serving" placeholder="Serving" />
          <input name="calories" type="number" placeholder="Calories" />
          <button type="submit">Add</button>
        </form>
      </section>

      <section>
        <h2>Activity</h2>
        <table><tbody id="activities"></tbody></table>
        <form class="entry" data-kind="activities">
          <input name="type" placeholder="Activity" />
          <input name="duration" placeholder="Duration" />
          <button type="submit">Add</button>
        </form>
      </section>

      <section>
        <h2>Notes</h2>
        <textarea id="notes"></textarea>
      </section>
    </div>

    <section id="history-view" class="hidden">
      <h2>History</h2>
      <table>
        <thead>
          <tr><th>Date</th><th>Meals</th><th>Meal times</th><th>Misc</th><th>Calories</th><th>Water</th><th>Activity</th><th>Ketosis</th><th>Plan</th></tr>
        </thead>
        <tbody id="history"></tbody>
      </table>
    </section>
  </main>

  <div id="recovery" class="overlay">
    <div class="panel">
      <h2>Stored data</h2>
      <p>food-journal-log</p>
      <textarea id="recovery-log" readonly></textarea>
      <p>food-journal-history</p>
      <textarea id="recovery-history" readonly></textarea>
      <button id="recovery-reload" type="button">Reload</button>
      <button id="recovery-close" class="ghost" type="button">Close</button>
    </div>
  </div>

  <script>
    let view = {{STATE}};
    let loadedToday = view ? view.today : null;

    const $ = (id) => document.getElementById(id);

    const api = async (method, path, body) => {
      const res = await fetch(path, {
        method,
        headers: body ? { 'content-type': 'application/json' } : {},
        body: body ? JSON.stringify(body) : undefined
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      return res.json();
    };

    const cell = (row, text) => {
      const td = document.createElement('td');
      td.textContent = text;
      row.appendChild(td);
    };

    const deleteButton = (row, kind, id) => {
      const td = document.createElement('td');
      const button = document.createElement('button');
      button.className = 'delete';
      button.textContent = 'Delete';
      button.addEventListener('click', () => send('DELETE', `/api/${kind}/${encodeURIComponent(id)}`));
      td.appendChild(button);
      row.appendChild(td);
    };

    const renderIntake = (tbodyId, kind, entries) => {
      const tbody = $(tbodyId);
      tbody.replaceChildren();
      (entries || []).forEach((entry) => {
        const row = document.createElement('tr');
        cell(row, entry.time);
        cell(row, entry.source);
        cell(row, entry.serving);
        cell(row, entry.calories);
        if (kind === 'meals') {
          cell(row, `${entry.hungerBefore} → ${entry.hungerAfter}`);
        }
        deleteButton(row, kind, entry.id);
        tbody.appendChild(row);
      });
    };

    const render = () => {
      if (!view) {
        return;
      }
      const record = view.record;
      $('date-label').textContent = view.dateLabel;
      $('date-picker').value = view.selectedDate;
      $('protein-goal').value = record.proteinGoal;
      $('ketosis').checked = record.ketosis;
      $('followed-plan').checked = record.followedPlan;
      if (document.activeElement !== $('notes')) {
        $('notes').value = record.notes;
      }

      const water = $('water');
      water.replaceChildren();
      for (let i = 0; i < 8; i += 1) {
        const pip = document.createElement('button');
        pip.type = 'button';
        pip.className = i < record.waterIntake ? 'pip full' : 'pip';
        pip.addEventListener('click', () => send('POST', `/api/water/${i}`));
        water.appendChild(pip);
      }

      renderIntake('meals', 'meals', record.foodEntries);
      renderIntake('misc', 'misc', record.miscEntries);

      const activities = $('activities');
      activities.replaceChildren();
      (record.activities || []).forEach((entry) => {
        const row = document.createElement('tr');
        cell(row, entry.type);
        cell(row, entry.duration);
        deleteButton(row, 'activities', entry.id);
        activities.appendChild(row);
      });
    };

    const send = async (method, path, body) => {
      try {
        view = await api(method, path, body);
        render();
      } catch (err) {
        console.error(err);
      }
    };

    const showHistory = async () => {
      const data = await api('GET', '/api/history');
      const tbody = $('history');
      tbody.replaceChildren();
      data.summaries.forEach((day) => {
        const row = document.createElement('tr');
        cell(row, day.dateLabel);
        cell(row, day.mealCount);
        cell(row, day.mealTimes.join(', '));
        cell(row, day.miscCount);
        cell(row, day.totalCalories);
        cell(row, `${day.waterIntake}/8`);
        cell(row, day.activityCount);
        cell(row, day.ketosis ? 'yes' : '');
        cell(row, day.followedPlan ? 'yes' : '');
        tbody.appendChild(row);
      });
      $('journal-view').classList.add('hidden');
      $('history-view').classList.remove('hidden');
    };

    const showJournal = () => {
      $('history-view').classList.add('hidden');
      $('journal-view').classList.remove('hidden');
    };

    const checkDate = async () => {
      try {
        const latest = await api('GET', '/api/journal');
        $('rollover').classList.toggle('show', latest.today !== loadedToday && !latest.isToday);
      } catch (err) {
        console.error(err);
      }
    };

    document.querySelectorAll('form.entry').forEach((form) => {
      form.addEventListener('submit', (event) => {
        event.preventDefault();
        const body = {};
        new FormData(form).forEach((value, key) => {
          const input = form.elements[key];
          body[key] = input.type === 'number' ? Number(value || 0) : value;
        });
        send('POST', `/api/${form.dataset.kind}`, body).then(() => form.reset());
      });
    });

    $('date-picker').addEventListener('change', (event) => {
      if (event.target.value) {
        send('POST', '/api/date', { date: event.target.value });
      }
    });
    $('today').addEventListener('click', () => {
      loadedToday = null;
      send('POST', '/api/date/today').then(() => {
        loadedToday = view.today;
        $('rollover').classList.remove('show');
      });
    });
    $('protein-goal').addEventListener('change', (event) => send('PATCH', '/api/record', { proteinGoal: event.target.value }));
    $('ketosis').addEventListener('change', (event) => send('PATCH', '/api/record', { ketosis: event.target.checked }));
    $('followed-plan').addEventListener('change', (event) => send('PATCH', '/api/record', { followedPlan: event.target.checked }));
    $('notes').addEventListener('change', (event) => send('PATCH', '/api/record', { notes: event.target.value }));

    $('view-journal').addEventListener('click', showJournal);
    $('view-history').addEventListener('click', () => showHistory().catch(console.error));
    $('print').addEventListener('click', () => window.print());

    $('recovery-open').addEventListener('click', async () => {
      const raw = await api('GET', '/api/recovery');
      $('recovery-log').value = raw.log || '';
      $('recovery-history').value = raw.history || '';
      $('recovery').classList.add('show');
    });
    $('recovery-close').addEventListener('click', () => $('recovery').classList.remove('show'));
    $('recovery-reload').addEventListener('click', () => window.location.reload());

    setInterval(checkDate, 60000);
    window.addEventListener('focus', checkDate);
    render();
  </script>
</body>
</html>
"#;
