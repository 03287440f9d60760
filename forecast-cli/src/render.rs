//! Plain-text rendering. Every function here is a pure function of its input.

use std::fmt::Write;

use chrono::Local;
use forecast_core::{DashboardView, ForecastSnapshot, Phase};

const COMPASS: [&str; 8] = ["С", "СВ", "В", "ЮВ", "Ю", "ЮЗ", "З", "СЗ"];
const HOURS_PER_ROW: usize = 6;

/// Eight-point compass direction the wind blows from.
pub fn compass(deg: u16) -> &'static str {
    let sector = ((u32::from(deg) * 2 + 45) / 90) % 8;
    COMPASS[sector as usize]
}

pub fn snapshot(snap: &ForecastSnapshot) -> String {
    let mut out = String::new();
    let current = &snap.current;

    if snap.is_unavailable() {
        let _ = writeln!(out, "{}", snap.location.name);
        let _ = write!(out, "{}", current.description);
        return out;
    }

    let _ = writeln!(out, "{}, {}", snap.location.name, snap.location.country);
    let _ = writeln!(
        out,
        "{} {}°C  {}",
        current.icon.glyph(),
        current.temp,
        current.description
    );
    let _ = writeln!(
        out,
        "Ощущается как {}°  Влажность {}%  Давление {} гПа  Ветер {:.1} м/с, {}",
        current.feels_like,
        current.humidity,
        current.pressure,
        current.wind_speed,
        compass(current.wind_deg)
    );

    if snap.is_degraded() {
        let _ = writeln!(out, "\nПочасовой и дневной прогноз недоступны.");
    } else {
        if !snap.hourly.is_empty() {
            let _ = writeln!(out, "\nПочасовой прогноз:");
            for row in snap.hourly.chunks(HOURS_PER_ROW) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|h| format!("{} {} {:>3}°", h.time, h.icon.glyph(), h.temp))
                    .collect();
                let _ = writeln!(out, "  {}", cells.join("   "));
            }
        }

        if !snap.forecast.is_empty() {
            let _ = writeln!(out, "\nПрогноз по дням:");
            for day in &snap.forecast {
                let _ = writeln!(
                    out,
                    "  {} {:<8} {} {:>3}° / {:>3}°  {:>3}%  {}",
                    day.weekday,
                    day.date,
                    day.icon.glyph(),
                    day.temp_high,
                    day.temp_low,
                    day.precipitation_chance,
                    day.condition
                );
            }
        }
    }

    let fetched = snap.fetched_at.with_timezone(&Local);
    let _ = write!(out, "\nОбновлено в {}", fetched.format("%H:%M"));
    out
}

/// One-line status shown under the forecast.
pub fn status_line(view: &DashboardView) -> String {
    match view.phase {
        Phase::Idle | Phase::Loading => format!("Прогноз для {}...", view.city),
        Phase::Error => format!(
            "Не удалось получить данные для города {}. Введите r, чтобы попробовать снова.",
            view.city
        ),
        Phase::BackgroundRefreshing => "Обновление...".to_string(),
        Phase::Ready => format!("Обновление: {}", view.refresh.remaining_label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use forecast_core::{DayPoint, HourlyPoint, Icon, Location, RefreshState};

    fn sample() -> ForecastSnapshot {
        let mut snap = ForecastSnapshot::unavailable("Волгоград", Utc::now());
        snap.location = Location {
            name: "Volgograd".into(),
            country: "RU".into(),
        };
        snap.current.temp = 12;
        snap.current.feels_like = 10;
        snap.current.wind_speed = 4.2;
        snap.current.wind_deg = 250;
        snap.current.description = "пасмурно".into();
        snap.current.icon = Icon::Cloud;
        snap
    }

    fn view(phase: Phase, snapshot: Option<ForecastSnapshot>) -> DashboardView {
        DashboardView {
            city: "Волгоград".into(),
            phase,
            snapshot,
            refresh: RefreshState {
                next_refresh_at: Utc::now(),
                remaining_label: "9:05".into(),
            },
            is_loading: phase == Phase::Loading,
            is_error: phase == Phase::Error,
        }
    }

    #[test]
    fn compass_points() {
        assert_eq!(compass(0), "С");
        assert_eq!(compass(44), "СВ");
        assert_eq!(compass(90), "В");
        assert_eq!(compass(250), "З");
        assert_eq!(compass(340), "С");
    }

    #[test]
    fn degraded_snapshot_mentions_missing_forecast() {
        let text = snapshot(&sample());
        assert!(text.contains("Volgograd, RU"));
        assert!(text.contains("12°C"));
        assert!(text.contains("Ветер 4.2 м/с, З"));
        assert!(text.contains("недоступны"));
    }

    #[test]
    fn full_snapshot_lists_hours_and_days() {
        let mut snap = sample();
        snap.hourly = (0..7)
            .map(|i| HourlyPoint {
                time: format!("{:02}:00", 12 + i),
                temp: 10,
                condition: "ясно".into(),
                icon: Icon::Sun,
            })
            .collect();
        snap.forecast = vec![DayPoint {
            date: "18 окт.".into(),
            weekday: "вс".into(),
            temp_high: 14,
            temp_low: 3,
            condition: "дождь".into(),
            icon: Icon::CloudRain,
            precipitation_chance: 20,
        }];

        let text = snapshot(&snap);
        assert!(text.contains("Почасовой прогноз:"));
        assert!(text.contains("18:00"));
        assert!(text.contains("вс 18 окт."));
        assert!(text.contains("дождь"));
        assert!(!text.contains("недоступны"));
    }

    #[test]
    fn error_snapshot_shows_description_only() {
        let snap = ForecastSnapshot::unavailable("Котово", Utc::now());
        let text = snapshot(&snap);
        assert_eq!(text, "Котово (Ошибка)\nНе удалось загрузить данные.");
    }

    #[test]
    fn status_line_follows_phase() {
        assert_eq!(status_line(&view(Phase::Ready, None)), "Обновление: 9:05");
        assert!(status_line(&view(Phase::Loading, None)).starts_with("Прогноз для Волгоград"));
        assert!(status_line(&view(Phase::Error, None)).contains("попробовать снова"));
        assert_eq!(status_line(&view(Phase::BackgroundRefreshing, None)), "Обновление...");
    }
}
