use std::io::Write;

use anyhow::Result;
use battlestat_core::{Confidence, ModelConfig, Prediction, StatTrack};
use colored::{ColoredString, Colorize};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    predictions: &'a [Prediction],
}

/// Group digits in thousands: `1234567.8` -> `1,234,568`.
pub fn format_stat(value: f64) -> String {
    let rounded = format!("{:.0}", value.max(0.0));
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (index, digit) in rounded.chars().enumerate() {
        if index > 0 && (rounded.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn confidence_badge(confidence: Confidence) -> ColoredString {
    match confidence {
        Confidence::High => confidence.label().green().bold(),
        Confidence::Medium => confidence.label().yellow().bold(),
        Confidence::Low => confidence.label().red().bold(),
    }
}

fn display_name(prediction: &Prediction) -> &str {
    if prediction.name.is_empty() {
        "(unnamed)"
    } else {
        &prediction.name
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    predictions: &[Prediction],
    model: &ModelConfig,
    verbose: bool,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Battle Stat Estimates".bright_cyan().bold())?;
    writeln!(out, "{}", "========================".cyan())?;

    for prediction in predictions {
        writeln!(out)?;
        writeln!(
            out,
            "{} (level {}, {})",
            display_name(prediction).bold(),
            prediction.level,
            if prediction.rank.is_empty() {
                "no rank"
            } else {
                prediction.rank.as_str()
            }
        )?;
        let energy = &prediction.energy;
        writeln!(
            out,
            "   Energy: {} ({} natural over {:.1} active days, {} from items, {} spent elsewhere)",
            format_stat(energy.total),
            format_stat(energy.natural),
            energy.active_days,
            format_stat(energy.items),
            format_stat(energy.expended)
        )?;
        writeln!(
            out,
            "   Split: {} legacy / {} current ({:.1}% before the formula change)",
            format_stat(prediction.split.legacy),
            format_stat(prediction.split.current),
            prediction.split.legacy_share * 100.0
        )?;
        let final_gym = model.gyms.get(prediction.final_gym).map_or_else(
            || format!("gym {}", prediction.final_gym + 1),
            |gym| gym.label(prediction.final_gym),
        );
        writeln!(out, "   Reached: {final_gym}")?;
        for track in StatTrack::ALL {
            writeln!(
                out,
                "   {:<10} {:>20}",
                track.to_string(),
                format_stat(prediction.stats[track])
            )?;
        }
        if prediction.boosters.enhancers > 0 {
            writeln!(
                out,
                "   Enhancers: {} (+{})",
                prediction.boosters.enhancers,
                format_stat(prediction.boosters.applied)
            )?;
        }
        writeln!(
            out,
            "   Total: {}",
            format_stat(prediction.total).bright_white().bold()
        )?;
        if let Some(correction) = prediction.rank_correction {
            let bracket = correction
                .upper
                .map_or_else(|| "open".to_string(), format_stat);
            writeln!(
                out,
                "   Rank bracket: tier {} [{} - {}] -> {}",
                correction.tier,
                format_stat(correction.lower),
                bracket,
                format_stat(correction.corrected)
            )?;
        }
        writeln!(
            out,
            "   Score: {:.0}  Confidence: {}",
            prediction.score,
            confidence_badge(prediction.confidence)
        )?;

        if verbose {
            for session in &prediction.sessions {
                writeln!(
                    out,
                    "     - {} {}: {} trains, {} energy, +{}",
                    session.phase,
                    model.gyms.get(session.gym).map_or_else(
                        || format!("gym {}", session.gym + 1),
                        |gym| gym.label(session.gym)
                    ),
                    session.trains,
                    format_stat(session.energy_used),
                    format_stat(session.gain)
                )?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, predictions: &[Prediction]) -> Result<()> {
    let report = JsonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        predictions,
    };
    let json_output = serde_json::to_string_pretty(&report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, predictions: &[Prediction]) -> Result<()> {
    writeln!(out, "# Battle Stat Estimates\n")?;
    writeln!(
        out,
        "| Name | Level | Energy | Strength | Speed | Dexterity | Defense | Total | Confidence |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
    for prediction in predictions {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            display_name(prediction),
            prediction.level,
            format_stat(prediction.energy.total),
            format_stat(prediction.stats.strength),
            format_stat(prediction.stats.speed),
            format_stat(prediction.stats.dexterity),
            format_stat(prediction.stats.defense),
            format_stat(prediction.final_estimate),
            prediction.confidence
        )?;
    }

    for prediction in predictions {
        writeln!(out, "\n## {}\n", display_name(prediction))?;
        writeln!(
            out,
            "- **Active days**: {:.1}",
            prediction.energy.active_days
        )?;
        writeln!(
            out,
            "- **Legacy / current energy**: {} / {}",
            format_stat(prediction.split.legacy),
            format_stat(prediction.split.current)
        )?;
        writeln!(out, "- **Sessions**: {}", prediction.sessions.len())?;
        writeln!(out, "- **Score**: {:.0}", prediction.score)?;
        if let Some(correction) = prediction.rank_correction {
            writeln!(
                out,
                "- **Rank correction**: {} -> {}",
                format_stat(correction.original),
                format_stat(correction.corrected)
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use battlestat_core::{PredictionOptions, TelemetrySnapshot, predict};

    fn sample() -> Prediction {
        let snapshot = TelemetrySnapshot {
            name: "Sample".to_string(),
            level: 20,
            rank: "Average".to_string(),
            captured_at: 1_704_067_200,
            age_days: 365,
            donator_days: 100,
            activity_time: 60 * 86_400,
            stat_enhancers: 2,
            ..TelemetrySnapshot::default()
        };
        predict(
            &snapshot,
            ModelConfig::bundled(),
            PredictionOptions {
                rank_correction: true,
            },
        )
    }

    #[test]
    fn stats_are_grouped_by_thousands() {
        assert_eq!(format_stat(0.0), "0");
        assert_eq!(format_stat(999.4), "999");
        assert_eq!(format_stat(1_000.0), "1,000");
        assert_eq!(format_stat(1_234_567.8), "1,234,568");
        assert_eq!(format_stat(-5.0), "0");
    }

    #[test]
    fn console_report_lists_every_track() {
        let mut buffer = Vec::new();
        generate_console_report(&mut buffer, &[sample()], ModelConfig::bundled(), true).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Sample"));
        assert!(text.contains("strength"));
        assert!(text.contains("defense"));
        assert!(text.contains("Rank bracket"));
    }

    #[test]
    fn json_report_round_trips_predictions() {
        let mut buffer = Vec::new();
        generate_json_report(&mut buffer, &[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["predictions"][0]["name"], "Sample");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn markdown_report_has_table_row() {
        let mut buffer = Vec::new();
        generate_markdown_report(&mut buffer, &[sample()]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("# Battle Stat Estimates"));
        assert!(text.contains("| Sample | 20 |"));
        assert!(text.contains("## Sample"));
    }
}
