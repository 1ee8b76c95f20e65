mod app;

use std::io;
use std::time::Duration;

use app::{format_metric, format_percent, format_time_ns, truncate, AppState, ConnectionStatus, NicheRow};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

const REFRESH_SECS: u64 = 5;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let region = std::env::var("REGION").unwrap_or_else(|_| "US".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url, region);

    // Initial fetch before rendering
    app.refresh(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut niche_table_state = TableState::default();
    niche_table_state.select(Some(0));

    let result = run_loop(&mut terminal, &mut app, &client, &mut niche_table_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
    niche_state: &mut TableState,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(REFRESH_SECS);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app, niche_state))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Char('s') | KeyCode::Char('S') => {
                            app.toggle_sort();
                            niche_state.select(Some(0));
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            let max = app.sorted_niches().len().saturating_sub(1);
                            let next = niche_state.selected().map_or(0, |i| (i + 1).min(max));
                            niche_state.select(Some(next));
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            let prev = niche_state
                                .selected()
                                .map_or(0, |i| i.saturating_sub(1));
                            niche_state.select(Some(prev));
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            app.refresh(client).await;
            last_tick = std::time::Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, niche_state: &mut TableState) {
    let area = f.area();

    // Outer vertical split: header | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_body(f, app, niche_state, chunks[1]);
    render_footer(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let run_str = app.latest.as_ref().map_or("no snapshot yet".to_string(), |l| {
        format!(
            "{} niches / {} videos @ {}",
            l.total_niches,
            l.analyzed_videos,
            format_time_ns(l.created_at)
        )
    });

    let p99_str = app
        .latency
        .p99_ms
        .map_or("—".to_string(), |v| format!("p99 {v:.0}ms"));

    let title_spans = vec![
        Span::styled(
            " Niche Scanner  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(format!("region {}", app.region), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(run_str, Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(
            format!(
                "yt {} req / {} err",
                app.health.youtube_requests.unwrap_or(0),
                app.health.youtube_errors.unwrap_or(0)
            ),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(p99_str, Style::default().fg(Color::White)),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans))
        .block(Block::default().borders(Borders::ALL).border_style(
            Style::default().fg(Color::DarkGray),
        ));

    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &AppState, niche_state: &mut TableState, area: Rect) {
    // Horizontal split: niches (60%) | detail (40%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let niches = app.sorted_niches();
    render_niche_table(f, app, &niches, niche_state, halves[0]);

    let selected = niche_state.selected().and_then(|i| niches.get(i).copied());
    render_detail(f, selected, halves[1]);
}

fn score_color(score: Option<f64>) -> Color {
    score.map_or(Color::DarkGray, |s| {
        if s >= 60.0 {
            Color::Green
        } else if s >= 40.0 {
            Color::Yellow
        } else {
            Color::Red
        }
    })
}

fn competition_color(competition: Option<f64>) -> Color {
    competition.map_or(Color::DarkGray, |c| {
        if c <= 40.0 {
            Color::Green
        } else if c <= 60.0 {
            Color::Yellow
        } else {
            Color::Red
        }
    })
}

fn render_niche_table(
    f: &mut Frame,
    app: &AppState,
    niches: &[&NicheRow],
    state: &mut TableState,
    area: Rect,
) {
    let header_cells = ["#", "Niche", "Score", "Comp", "Views", "N"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = niches
        .iter()
        .enumerate()
        .map(|(i, n)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&n.name, 26)),
                Cell::from(format_metric(n.score)).style(Style::default().fg(score_color(n.score))),
                Cell::from(format_metric(n.competition))
                    .style(Style::default().fg(competition_color(n.competition))),
                Cell::from(n.avg_views_formatted.clone()).style(Style::default().fg(Color::Cyan)),
                Cell::from(n.video_count.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(4),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                format!(" NICHES by {} ", app.sort.label()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    )
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, state);
}

fn render_detail(f: &mut Frame, niche: Option<&NicheRow>, area: Rect) {
    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Yellow));

    let lines = match niche {
        None => vec![Line::from(Span::styled(
            "no niche selected",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(n) => vec![
            Line::from(Span::styled(
                n.name.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![label("category     "), Span::raw(n.category_id.clone())]),
            Line::from(vec![label("avg views    "), Span::raw(n.avg_views_formatted.clone())]),
            Line::from(vec![label("engagement   "), Span::raw(format_percent(n.engagement))]),
            Line::from(vec![
                label("traffic      "),
                Span::raw(format_metric(n.traffic_potential)),
            ]),
            Line::from(vec![
                label("competition  "),
                Span::styled(
                    format_metric(n.competition),
                    Style::default().fg(competition_color(n.competition)),
                ),
            ]),
            Line::from(vec![
                label("score        "),
                Span::styled(format_metric(n.score), Style::default().fg(score_color(n.score))),
            ]),
            Line::from(vec![
                label("concentration"),
                Span::raw(format!(
                    " {}",
                    n.view_concentration.map_or("—".to_string(), |g| format!("{g:.3}"))
                )),
            ]),
            Line::from(vec![
                label("sample       "),
                Span::raw(format!("{} videos ({})", n.video_count, n.data_quality)),
            ]),
        ],
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " DETAIL ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[s] ", Style::default().fg(Color::Yellow)),
        Span::raw(format!("sort ({})  ", app.sort.toggle().label())),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("select  "),
        Span::styled(
            format!(
                "auto-refresh: {REFRESH_SECS}s (updated {}s ago)",
                app.last_refresh.elapsed().as_secs()
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
