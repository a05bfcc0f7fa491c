//! Plain-text presentation of the view state.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use weatherview_core::{
    BoundaryMatcher, CurrentConditions, Flow, FlowView, ForecastRow, ForecastSet,
    ReductionPolicy, SlotState, WeatherError, reduce,
};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub matcher: BoundaryMatcher,
    pub policy: ReductionPolicy,
}

pub fn flow(view: &FlowView, flow: Flow, options: &RenderOptions) -> String {
    let mut out = String::new();

    match &view.conditions {
        SlotState::NotLoaded => {
            out.push_str(match flow {
                Flow::CurrentLocation => "No weather loaded yet. Choose Refresh to load it.\n",
                Flow::Search => "Search for a city to see its weather.\n",
            });
            return out;
        }
        SlotState::Loading => {
            out.push_str("Loading...\n");
            return out;
        }
        SlotState::Loaded(result) => match result.success() {
            Some(conditions) => out.push_str(&card(view.label.as_deref(), conditions)),
            None => {
                if let Some(err) = result.failure() {
                    out.push_str(&failure(err));
                }
                // Location failures replace the whole screen.
                if result.failure().is_some_and(WeatherError::is_location_failure) {
                    return out;
                }
            }
        },
    }

    match &view.forecast {
        SlotState::Loaded(result) => match (result.success(), result.failure()) {
            (Some(set), _) => out.push_str(&forecast(set, options)),
            (None, Some(err)) => {
                out.push_str(&format!("\nForecast unavailable: {}\n", err.user_message()))
            }
            (None, None) => {}
        },
        SlotState::Loading => out.push_str("\nForecast loading...\n"),
        SlotState::NotLoaded => {}
    }

    out
}

fn failure(err: &WeatherError) -> String {
    if err.is_location_failure() {
        format!("⚠  {}\n", err.user_message())
    } else {
        format!("{}\n", err.user_message())
    }
}

fn card(label: Option<&str>, c: &CurrentConditions) -> String {
    let title = label
        .map(str::to_string)
        .or_else(|| c.place_name.as_ref().map(|name| format!("{name}, {}", c.country_code)))
        .unwrap_or_else(|| "Unknown place".to_string());

    let mut lines = vec![
        title,
        format!("  {} {}", icon(&c.icon_id), c.description),
        format!("  Temperature   {:.1}°C (feels like {:.1}°C)", c.temperature_c, c.feels_like_c),
        match c.wind_gust {
            Some(gust) => format!("  Wind          {:.1} m/s, gusts {:.1} m/s", c.wind_speed, gust),
            None => format!("  Wind          {:.1} m/s", c.wind_speed),
        },
    ];

    if let Some(mm) = c.precipitation_1h {
        lines.push(format!("  Precipitation {mm:.1} mm (last hour)"));
    }

    match (c.sunrise_local(), c.sunset_local()) {
        (Some(rise), Some(set)) => {
            lines.push(format!("  Sunrise {}  Sunset {}", hh_mm(rise), hh_mm(set)))
        }
        (Some(rise), None) => lines.push(format!("  Sunrise {}", hh_mm(rise))),
        (None, Some(set)) => lines.push(format!("  Sunset {}", hh_mm(set))),
        (None, None) => {}
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn forecast(set: &ForecastSet, options: &RenderOptions) -> String {
    let rows = reduce(set, &options.matcher, options.policy);
    if rows.is_empty() {
        return "\nNo forecast slots match the daily marker.\n".to_string();
    }

    let offset = FixedOffset::east_opt(set.timezone_offset_secs).unwrap_or_else(|| Utc.fix());

    let mut out = String::from("\nForecast\n");
    for row in &rows {
        out.push_str(&forecast_row(row, offset));
        out.push('\n');
    }
    out
}

fn forecast_row(row: &ForecastRow, offset: FixedOffset) -> String {
    let e = &row.entry;
    let when = e
        .time_utc()
        .map(|t| t.with_timezone(&offset).format("%a %d.%m %H:%M").to_string())
        .unwrap_or_else(|| e.time_of_day_text.clone());

    let mut line = if row.is_boundary() {
        format!("  {when}  {} {:>5.1}°C  {}", icon(&e.icon_id), e.temperature_c, e.description)
    } else {
        format!("      {when}  {:>5.1}°C  {}", e.temperature_c, e.description)
    };

    line.push_str(&format!("  wind {:.1} m/s", e.wind_speed));
    if let Some(gust) = e.wind_gust {
        line.push_str(&format!(" (gusts {gust:.1})"));
    }
    if let Some(mm) = e.precipitation_3h {
        line.push_str(&format!("  {mm:.1} mm"));
    }
    line
}

fn hh_mm(t: DateTime<FixedOffset>) -> String {
    t.format("%H:%M").to_string()
}

/// Glyph for an OpenWeather icon id such as `10d`.
fn icon(icon_id: &str) -> &'static str {
    match icon_id.get(..2) {
        Some("01") => "☀",
        Some("02") => "⛅",
        Some("03") | Some("04") => "☁",
        Some("09") | Some("10") => "🌧",
        Some("11") => "⛈",
        Some("13") => "❄",
        Some("50") => "🌫",
        _ => "·",
    }
}
