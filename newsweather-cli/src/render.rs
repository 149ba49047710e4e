use chrono::{DateTime, Utc};
use newsweather_core::{Article, Failure, Phase, Snapshot, WeatherSnapshot};

pub fn failures(failures: &[Failure]) {
    for failure in failures {
        eprintln!("! {}: {}", failure.kind, failure.message);
    }
}

pub fn snapshot(snap: &Snapshot) {
    let ctx = &snap.context;
    let badge = if ctx.is_default { " [default]" } else { "" };
    println!();
    let now = Utc::now();
    println!(
        "News & Weather | {}, {}{}  ({})",
        ctx.city,
        ctx.country,
        badge,
        now.format("%a, %b %-d %H:%M")
    );
    println!("location: {} ({})", ctx.coordinates, snap.permission);

    match &snap.weather {
        Some(weather) => print_weather(weather),
        None => println!("weather: unavailable"),
    }
    if snap.refreshing || snap.phase == Phase::Loading {
        println!("(updating...)");
    }

    println!();
    if snap.query.is_empty() {
        println!("Trending ({} articles)", snap.articles.len());
    } else {
        println!(
            "Searching for \"{}\": {} of {} articles",
            snap.query,
            snap.articles.len(),
            snap.total_articles
        );
    }

    for (i, article) in snap.articles.iter().enumerate() {
        print_article(i + 1, article, now);
    }
}

fn print_weather(w: &WeatherSnapshot) {
    println!(
        "{} {}°C {} (feels like {}°C) | humidity {}% | wind {} km/h | pressure {} mb | {}",
        condition_icon(&w.condition),
        w.temp_c,
        w.condition,
        w.feels_like_c,
        w.humidity_pct,
        w.wind_kph,
        w.pressure_mb,
        w.location_label,
    );
}

fn print_article(n: usize, a: &Article, now: DateTime<Utc>) {
    println!("{n:>2}. {}", a.title);
    println!("    {}", a.description);
    println!("    {} · {} · {}", a.source_name, time_ago(a.published_at, now), a.url);
}

/// Icon for a weather condition; first matching keyword wins.
fn condition_icon(condition: &str) -> &'static str {
    const TABLE: &[(&[&str], &str)] = &[
        (&["rain"], "🌧️"),
        (&["cloud"], "☁️"),
        (&["clear", "sunny"], "☀️"),
        (&["snow"], "❄️"),
        (&["wind"], "💨"),
        (&["thunder"], "⛈️"),
        (&["mist", "fog"], "🌫️"),
    ];

    let lower = condition.to_lowercase();
    TABLE
        .iter()
        .find(|(keys, _)| keys.iter().any(|k| lower.contains(k)))
        .map(|(_, icon)| *icon)
        .unwrap_or("🌤️")
}

fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let minutes = delta.num_minutes();

    match minutes {
        m if m < 1 => "just now".to_string(),
        m if m < 60 => format!("{m} min ago"),
        m if m < 60 * 24 => format!("{} h ago", m / 60),
        m if m < 60 * 24 * 30 => format!("{} d ago", m / (60 * 24)),
        _ => then.format("%Y-%m-%d").to_string(),
    }
}
