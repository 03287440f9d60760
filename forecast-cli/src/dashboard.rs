use std::{io::Write, sync::Arc};

use forecast_core::{City, Config, DashboardView, ForecastFetcher, RefreshScheduler};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

/// A line typed by the user while `watch` is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Refresh,
    Quit,
    City(City),
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" | "r" | "R" | "к" => Input::Refresh,
        "q" | "Q" | "й" | "quit" | "exit" => Input::Quit,
        other => match City::try_from(other) {
            Ok(city) => Input::City(city),
            Err(_) => Input::Unknown(other.to_string()),
        },
    }
}

/// Run the live dashboard until the user quits or stdin closes.
pub async fn run(config: &Config, city: City) -> anyhow::Result<()> {
    tracing::info!(%city, interval_secs = config.refresh.interval_secs, "starting live dashboard");
    let fetcher = Arc::new(ForecastFetcher::from_config(config)?);
    let handle = RefreshScheduler::spawn(fetcher, config.refresh.clone(), city.as_str());
    let mut views = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Enter: обновить, название города: сменить город, q: выход.");
    let mut screen = Screen::default();
    screen.draw(&views.borrow_and_update())?;

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                screen.draw(&view)?;
            }
            line = lines.next_line() => match line? {
                None => break,
                Some(line) => match parse_input(&line) {
                    Input::Refresh => handle.refresh().await?,
                    Input::Quit => break,
                    Input::City(city) => handle.select_city(city.as_str()).await?,
                    Input::Unknown(text) => {
                        let names: Vec<&str> = City::all().iter().map(City::as_str).collect();
                        println!("Неизвестная команда или город '{text}'. Города: {}.", names.join(", "));
                    }
                },
            },
        }
    }

    println!();
    handle.shutdown().await
}

/// Redraws the full dashboard only when its content changes; countdown-only
/// changes rewrite the status line in place.
#[derive(Debug, Default)]
struct Screen {
    body: Option<String>,
}

impl Screen {
    fn draw(&mut self, view: &DashboardView) -> std::io::Result<()> {
        let body = view
            .snapshot
            .as_ref()
            .map(render::snapshot)
            .unwrap_or_default();
        let status = render::status_line(view);
        let mut stdout = std::io::stdout().lock();

        if self.body.as_deref() == Some(body.as_str()) {
            write!(stdout, "\r\x1b[2K{status}")?;
        } else {
            if !body.is_empty() {
                write!(stdout, "\n{body}\n")?;
            }
            write!(stdout, "{status}")?;
            self.body = Some(body);
        }
        stdout.flush()
    }
}
