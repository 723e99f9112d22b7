use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use vitals_dashboard::ai::{AiError, AiTask, GeminiClient, InsightService};
use vitals_dashboard::capture::{
    generate_patient, CaptureAdapter, CaptureError, ManualEntry, NdefMessage, NdefRecord,
    NfcCapture, NfcEvent, ScriptedReader, TranscriptLines, VitalsForm, VoiceCapture,
};
use vitals_dashboard::care::{DailyLog, LogKind, MedicationSchedule};
use vitals_dashboard::chart::TimeRange;
use vitals_dashboard::vitals::VitalType;
use vitals_dashboard::{Config, Dashboard, Patient};

/// Patient vitals dashboard with AI-assisted insights
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file (defaults to ~/.vitals-dashboard/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
struct SessionArgs {
    /// Time range: 24h, 7d or 30d
    #[arg(short, long)]
    range: Option<TimeRange>,

    /// Vital shown in the chart (heart-rate, bp, temp, spo2)
    #[arg(long, default_value = "heart-rate")]
    vital: VitalType,

    /// Seed for the generated history
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show vital cards and the chart
    Show {
        #[command(flatten)]
        session: SessionArgs,

        /// Zoom in this many steps
        #[arg(long, default_value = "0")]
        zoom_in: u32,

        /// Zoom out this many steps
        #[arg(long, default_value = "0")]
        zoom_out: u32,

        /// Drag the chart by this many character columns (positive reveals earlier time)
        #[arg(long, allow_hyphen_values = true)]
        pan: Option<f64>,

        /// Print cards and chart rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a reading from the manual entry form
    Add {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(long = "hr", default_value = "")]
        heart_rate: String,
        #[arg(long, default_value = "")]
        systolic: String,
        #[arg(long, default_value = "")]
        diastolic: String,
        #[arg(long = "temp", default_value = "")]
        temperature: String,
        #[arg(long = "spo2", default_value = "")]
        oxygen_saturation: String,
    },

    /// Record a reading from an NFC tag payload (file path, or "-" for stdin)
    Nfc {
        #[command(flatten)]
        session: SessionArgs,

        payload: PathBuf,
    },

    /// Record a reading from a spoken transcript (one line per final result, stdin if omitted)
    Voice {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(long = "text")]
        lines: Vec<String>,
    },

    /// AI summary of recent vitals with recommendations
    Insights {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// AI smart alerts for subtle patterns
    Alerts {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// AI briefing for a doctor consultation
    Consult {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Summarize a free-text medical history into conditions and allergies
    Summary {
        /// History text (defaults to the configured medical history)
        history: Option<String>,
    },

    /// AI feature ideas for the app
    Ideas,

    /// Daily meal/activity log with optional AI correlation insights
    Log {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(long)]
        meal: Vec<String>,

        #[arg(long)]
        activity: Vec<String>,

        /// Ask the AI for correlations between the log and the vitals
        #[arg(long)]
        insights: bool,

        /// Also list medication reminders
        #[arg(long)]
        medications: bool,
    },

    /// Show or update the configuration
    Config {
        /// Store the Gemini API key
        #[arg(long)]
        api_key: Option<String>,

        /// Gemini model name
        #[arg(long)]
        model: Option<String>,

        /// Default time range
        #[arg(long)]
        range: Option<TimeRange>,

        /// Free-text medical history of the patient
        #[arg(long)]
        history: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (config, config_path) = match &args.config {
        Some(path) => (Config::load(path)?, path.clone()),
        None => (Config::load_or_default()?, Config::default_path()?),
    };
    debug!("Config loaded from {}", config_path.display());

    match args.command {
        Command::Show {
            session,
            zoom_in,
            zoom_out,
            pan,
            json,
        } => {
            let mut dash = open_dashboard(&config, &session);
            let chart = dash.chart_mut();
            for _ in 0..zoom_in {
                if !chart.zoom_in() {
                    info!("Minimum zoom reached");
                    break;
                }
            }
            for _ in 0..zoom_out {
                chart.zoom_out();
            }
            if let Some(columns) = pan {
                let width = config.chart_width as f64;
                chart.pan_by(0.0, columns, width);
            }
            if json {
                let out = serde_json::json!({
                    "cards": dash.cards(),
                    "rows": dash.chart_rows(),
                    "visible": dash.chart().visible(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_dashboard(&dash, &config);
            }
        }

        Command::Add {
            session,
            heart_rate,
            systolic,
            diastolic,
            temperature,
            oxygen_saturation,
        } => {
            let form = VitalsForm {
                heart_rate,
                systolic,
                diastolic,
                temperature,
                oxygen_saturation,
            };
            let mut adapter = ManualEntry::new(form);
            capture_into_dashboard(&config, &session, &mut adapter).await?;
        }

        Command::Nfc { session, payload } => {
            let text = read_input(&payload)?;
            let reader = ScriptedReader::new([NfcEvent::Reading(NdefMessage {
                records: vec![NdefRecord::text(&text)],
            })]);
            let mut adapter = NfcCapture::new(reader);
            capture_into_dashboard(&config, &session, &mut adapter).await?;
        }

        Command::Voice { session, lines } => {
            let lines = if lines.is_empty() {
                std::io::stdin()
                    .lock()
                    .lines()
                    .collect::<std::io::Result<Vec<_>>>()
                    .context("Failed to read transcript from stdin")?
            } else {
                lines
            };
            let Some(service) = insight_service(&config, AiTask::VitalsExtraction) else {
                return Ok(());
            };
            let mut adapter = VoiceCapture::new(TranscriptLines::new(lines), service);
            capture_into_dashboard(&config, &session, &mut adapter).await?;
        }

        Command::Insights { session } => {
            let dash = open_dashboard(&config, &session);
            let Some(service) = insight_service(&config, AiTask::HealthInsights) else {
                return Ok(());
            };
            match service.health_insights(&dash.patient().vitals).await {
                Ok(insight) => {
                    println!("{}\n", insight.summary);
                    for rec in insight.recommendations {
                        println!("  - {}", rec);
                    }
                }
                Err(e) => report_ai_error(AiTask::HealthInsights, &e),
            }
        }

        Command::Alerts { session } => {
            let dash = open_dashboard(&config, &session);
            let Some(service) = insight_service(&config, AiTask::SmartAlerts) else {
                return Ok(());
            };
            match service.smart_alerts(dash.patient()).await {
                Ok(alerts) if alerts.is_empty() => println!("No alerts."),
                Ok(alerts) => {
                    for alert in alerts {
                        println!("[{}] {}\n    {}", alert.severity, alert.finding, alert.context);
                    }
                }
                Err(e) => report_ai_error(AiTask::SmartAlerts, &e),
            }
        }

        Command::Consult { session } => {
            let dash = open_dashboard(&config, &session);
            let Some(service) = insight_service(&config, AiTask::ConsultationSummary) else {
                return Ok(());
            };
            match service.consultation_summary(dash.patient()).await {
                Ok(summary) => {
                    println!("Key observations:");
                    for item in summary.key_observations {
                        println!("  - {}", item);
                    }
                    println!("\nQuestions for the doctor:");
                    for item in summary.suggested_questions {
                        println!("  - {}", item);
                    }
                }
                Err(e) => report_ai_error(AiTask::ConsultationSummary, &e),
            }
        }

        Command::Summary { history } => {
            let history = history.unwrap_or_else(|| config.medical_history.clone());
            let Some(service) = insight_service(&config, AiTask::MedicalSummary) else {
                return Ok(());
            };
            match service.medical_summary(&history).await {
                Ok(summary) => {
                    println!("Conditions: {}", join_or_none(&summary.conditions));
                    println!("Allergies:  {}", join_or_none(&summary.allergies));
                }
                Err(e) => report_ai_error(AiTask::MedicalSummary, &e),
            }
        }

        Command::Ideas => {
            let Some(service) = insight_service(&config, AiTask::FeatureIdeas) else {
                return Ok(());
            };
            match service.feature_ideas().await {
                Ok(ideas) => {
                    for idea in ideas {
                        println!("{}\n    {}", idea.name, idea.description);
                    }
                }
                Err(e) => report_ai_error(AiTask::FeatureIdeas, &e),
            }
        }

        Command::Log {
            session,
            meal,
            activity,
            insights,
            medications,
        } => {
            let now = Utc::now();
            let mut log = DailyLog::sample(now);
            let entries = meal
                .iter()
                .map(|m| (LogKind::Meal, m))
                .chain(activity.iter().map(|a| (LogKind::Activity, a)));
            for (kind, description) in entries {
                if let Err(e) = log.add(kind, description, now) {
                    eprintln!("{}", e);
                }
            }
            for entry in log.entries() {
                println!(
                    "{}  {:<8} {}",
                    entry.timestamp.with_timezone(&Local).format("%b %-d %-I:%M %p"),
                    entry.kind,
                    entry.description
                );
            }
            if medications {
                println!("\nMedication reminders:");
                for reminder in MedicationSchedule::sample().reminders() {
                    println!("  {}  {} {}", reminder.time, reminder.medication, reminder.dosage);
                }
            }
            if insights {
                let dash = open_dashboard(&config, &session);
                let Some(service) = insight_service(&config, AiTask::DietaryInsights) else {
                    return Ok(());
                };
                match service.dietary_insights(log.entries(), &dash.patient().vitals).await {
                    Ok(items) => {
                        println!("\nCorrelation insights:");
                        for item in items {
                            println!("  - {}", item);
                        }
                    }
                    Err(e) => report_ai_error(AiTask::DietaryInsights, &e),
                }
            }
        }

        Command::Config {
            api_key,
            model,
            range,
            history,
        } => {
            let mut config = config;
            let changed = api_key.is_some() || model.is_some() || range.is_some() || history.is_some();
            if let Some(key) = api_key {
                config.gemini_api_key = Some(key.trim().to_string()).filter(|k| !k.is_empty());
            }
            if let Some(model) = model {
                config.gemini_model = model;
            }
            if let Some(range) = range {
                config.default_time_range = range;
            }
            if let Some(history) = history {
                config.medical_history = history;
            }
            if changed {
                config.save(&config_path)?;
                info!("Config saved to {}", config_path.display());
            }
            let mut shown = config.clone();
            if shown.gemini_api_key.is_some() {
                shown.gemini_api_key = Some("********".to_string());
            }
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
    }

    Ok(())
}

/// Fresh session over a generated history for the selected range
fn open_dashboard(config: &Config, session: &SessionArgs) -> Dashboard {
    let range = session.range.unwrap_or(config.default_time_range);
    let mut rng = match session.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut patient = generate_patient(range, Utc::now(), &mut rng);
    patient.name = config.patient_name.clone();
    patient.age = config.patient_age;
    patient.medical_history = config.medical_history.clone();

    let mut dash = Dashboard::new(patient, range);
    dash.select_vital(session.vital);
    dash
}

async fn capture_into_dashboard(
    config: &Config,
    session: &SessionArgs,
    adapter: &mut dyn CaptureAdapter,
) -> Result<()> {
    let mut dash = open_dashboard(config, session);
    match adapter.capture().await {
        Ok(entry) => {
            info!("Captured reading via {}", adapter.source());
            dash.add_new_vital(entry, Utc::now());
            print_dashboard(&dash, config);
            Ok(())
        }
        Err(CaptureError::Ai(e)) => {
            report_ai_error(AiTask::VitalsExtraction, &e);
            Ok(())
        }
        Err(e) => bail!("{}", e),
    }
}

fn insight_service(config: &Config, task: AiTask) -> Option<InsightService<GeminiClient>> {
    let client = config
        .api_key()
        .ok_or(AiError::MissingApiKey)
        .and_then(|key| {
            GeminiClient::with_options(
                &key,
                &config.gemini_model,
                &config.gemini_endpoint,
                config.request_timeout(),
            )
        });
    match client {
        Ok(client) => Some(InsightService::new(client).with_window(config.ai_window)),
        Err(e) => {
            report_ai_error(task, &e);
            None
        }
    }
}

fn report_ai_error(task: AiTask, err: &AiError) {
    error!("{} failed: {}", task, err);
    eprintln!("\n{}", err.user_message_for(task));
    if !matches!(err, AiError::MissingApiKey) {
        eprintln!("Run the command again to retry.");
    }
}

fn print_dashboard(dash: &Dashboard, config: &Config) {
    let patient: &Patient = dash.patient();
    println!("{}, age {}  ({})\n", patient.name, patient.age, dash.time_range().label());
    for card in dash.cards() {
        println!(
            "  {:<18} {:>8} {:<5} {}{}",
            card.title(),
            card.value,
            card.unit,
            card.trend.arrow(),
            if card.critical { "  CRITICAL" } else { "" }
        );
    }
    println!();
    print!("{}", dash.render_chart(config.render_options(), &Local));
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read payload from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload {}", path.display()))
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
