use clap::{Parser, Subcommand};
use colored::*;
use pulsemon_core::store::live::{DEFAULT_FRESHNESS_SECS, DEFAULT_LIVE_FILE};
use pulsemon_core::store::settings::DEFAULT_SETTINGS_FILE;
use pulsemon_core::store::users::DEFAULT_USERS_FILE;
use pulsemon_core::{
    export, metrics::IntervalMetrics, report, LiveLeadFile, PatientDetails, ReportInput,
    SettingsManager, TestMode, UserStore, VERSION,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "pulsemon")]
#[command(version = VERSION)]
#[command(about = "PulseMon ECG toolkit - CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the state of the live acquisition file
    Status {
        /// Path of the live Lead II JSON file
        #[arg(long, default_value = DEFAULT_LIVE_FILE)]
        live_file: PathBuf,
    },

    /// List serial ports present on this machine
    Ports,

    /// Export the live Lead II window to CSV
    ExportCsv {
        /// Path of the live Lead II JSON file
        #[arg(long, default_value = DEFAULT_LIVE_FILE)]
        live_file: PathBuf,

        /// Output CSV path
        #[arg(short, long, default_value = "lead_ii.csv")]
        output: PathBuf,
    },

    /// Generate an HTML report from observed interval values
    Report {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "")]
        age: String,
        #[arg(long, default_value = "")]
        gender: String,

        /// Test mode naming the report (e.g. twelve-lead)
        #[arg(long, default_value = "twelve-lead")]
        mode: String,

        /// Observed values; anything non-numeric is treated as 0
        #[arg(long, default_value = "0")]
        hr: String,
        #[arg(long, default_value = "0")]
        pr: String,
        #[arg(long, default_value = "0")]
        qrs: String,
        #[arg(long, default_value = "0")]
        qt: String,
        #[arg(long, default_value = "0")]
        qtc: String,
        #[arg(long, default_value = "0")]
        st: String,
        #[arg(long)]
        qrs_axis: Option<String>,

        /// Directory holding per-lead waveform images (lead_<name>.png)
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Output HTML path
        #[arg(short, long, default_value = "ecg_report.html")]
        output: PathBuf,
    },

    /// Manage the local user registry
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Inspect and update device settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user
    Register {
        username: String,
        password: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long, default_value = DEFAULT_USERS_FILE)]
        file: PathBuf,
    },

    /// Verify a username/password pair
    Verify {
        username: String,
        password: String,
        #[arg(long, default_value = DEFAULT_USERS_FILE)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print every setting
    Show {
        #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
        file: PathBuf,
    },

    /// Print one setting
    Get {
        key: String,
        #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
        file: PathBuf,
    },

    /// Update one setting
    Set {
        key: String,
        value: String,
        #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Status { live_file }) => {
            println!("{}", "=== PulseMon Live Status ===".green().bold());
            show_status(&live_file);
        }
        Some(Commands::Ports) => {
            println!("{}", "=== Serial Ports ===".green().bold());
            show_ports();
        }
        Some(Commands::ExportCsv { live_file, output }) => {
            println!("{}", "=== PulseMon CSV Export ===".green().bold());
            export_live_csv(&live_file, &output);
        }
        Some(Commands::Report {
            first_name,
            last_name,
            age,
            gender,
            mode,
            hr,
            pr,
            qrs,
            qt,
            qtc,
            st,
            qrs_axis,
            images_dir,
            output,
        }) => {
            println!("{}", "=== PulseMon Report ===".green().bold());
            generate_report(ReportArgs {
                patient: PatientDetails {
                    first_name,
                    last_name,
                    age,
                    gender,
                },
                mode,
                hr,
                pr,
                qrs,
                qt,
                qtc,
                st,
                qrs_axis,
                images_dir,
                output,
            });
        }
        Some(Commands::User { action }) => run_user(action),
        Some(Commands::Settings { action }) => run_settings(action),
        Some(Commands::Version) => {
            println!("PulseMon v{}", VERSION);
            println!("12-lead ECG acquisition and reporting toolkit");
        }
        None => {
            println!("{}", "=== PulseMon Status ===".green().bold());
            show_status(&PathBuf::from(DEFAULT_LIVE_FILE));
        }
    }
}

fn show_status(live_file: &PathBuf) {
    let live = LiveLeadFile::new(live_file);

    match live.read() {
        Ok(Some(snapshot)) => {
            println!("\n{}", "✅ Live file found:".green());
            println!("  Lead:     {}", snapshot.lead);
            println!("  Samples:  {}", snapshot.samples.len());
            println!(
                "  Age:      {}",
                humantime::format_duration(std::time::Duration::from_secs(
                    snapshot.age_secs() as u64
                ))
            );
            if let Some(rate) = snapshot.sample_rate_hz {
                println!("  Rate:     {} Hz", rate);
            }
            if !snapshot.samples.is_empty() {
                let min = snapshot.samples.iter().copied().fold(f64::INFINITY, f64::min);
                let max = snapshot
                    .samples
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max);
                let mean =
                    snapshot.samples.iter().sum::<f64>() / snapshot.samples.len() as f64;
                println!("  Window:   min {:.1}, mean {:.1}, max {:.1}", min, mean, max);
            }

            if snapshot.is_stale(DEFAULT_FRESHNESS_SECS) {
                println!("\n{}", "⚠️  Data is stale, acquisition may be down".yellow());
            } else {
                println!("\n{}", "✅ Data is fresh".green());
            }
        }
        Ok(None) => {
            println!(
                "\n{}",
                format!("⚠️  Live file not found: {}", live_file.display()).yellow()
            );
        }
        Err(e) => {
            println!("\n{}", format!("❌ Error reading live file: {}", e).red());
            std::process::exit(1);
        }
    }
}

fn show_ports() {
    match pulsemon_core::serial::list_ports() {
        Ok(ports) if ports.is_empty() => {
            println!("\n{}", "⚠️  No serial ports found".yellow());
        }
        Ok(ports) => {
            for port in ports {
                println!("  {}", port);
            }
        }
        Err(e) => {
            println!("\n{}", format!("❌ Error listing ports: {}", e).red());
            std::process::exit(1);
        }
    }
}

fn export_live_csv(live_file: &PathBuf, output: &PathBuf) {
    let live = LiveLeadFile::new(live_file);

    let snapshot = match live.read() {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            println!(
                "{}",
                format!("❌ Live file not found: {}", live_file.display()).red()
            );
            std::process::exit(1);
        }
        Err(e) => {
            println!("{}", format!("❌ Error reading live file: {}", e).red());
            std::process::exit(1);
        }
    };

    match export::export_lead_csv(snapshot.lead, &snapshot.samples, output) {
        Ok(()) => {
            println!(
                "{}",
                format!(
                    "✅ Exported {} samples to {}",
                    snapshot.samples.len(),
                    output.display()
                )
                .green()
            );
        }
        Err(e) => {
            println!("{}", format!("❌ Export failed: {}", e).red());
            std::process::exit(1);
        }
    }
}

struct ReportArgs {
    patient: PatientDetails,
    mode: String,
    hr: String,
    pr: String,
    qrs: String,
    qt: String,
    qtc: String,
    st: String,
    qrs_axis: Option<String>,
    images_dir: Option<PathBuf>,
    output: PathBuf,
}

fn generate_report(args: ReportArgs) {
    let mode = match TestMode::from_str(&args.mode) {
        Ok(mode) => mode,
        Err(e) => {
            println!("{}", format!("❌ {}", e).red());
            std::process::exit(1);
        }
    };

    let metrics = IntervalMetrics::from_strings(
        &args.hr,
        &args.pr,
        &args.qrs,
        &args.qt,
        &args.qtc,
        &args.st,
        args.qrs_axis.as_deref(),
    );

    let flagged = metrics.out_of_range();
    if !flagged.is_empty() {
        println!(
            "{}",
            format!("⚠️  Out of range: {}", flagged.join(", ")).yellow()
        );
    }

    let mut lead_images = HashMap::new();
    if let Some(dir) = &args.images_dir {
        for lead in pulsemon_core::Lead::all() {
            lead_images.insert(lead, dir.join(format!("lead_{}.png", lead.as_str())));
        }
    }

    let input = ReportInput {
        test_name: mode.title().to_string(),
        date_time: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        patient: args.patient,
        metrics,
        lead_images,
    };

    match report::write_report(&input, &args.output) {
        Ok(()) => {
            println!(
                "{}",
                format!("✅ Report written to {}", args.output.display()).green()
            );
        }
        Err(e) => {
            println!("{}", format!("❌ Report failed: {}", e).red());
            std::process::exit(1);
        }
    }
}

fn run_user(action: UserAction) {
    match action {
        UserAction::Register {
            username,
            password,
            role,
            file,
        } => {
            let mut users = match UserStore::load(&file) {
                Ok(users) => users,
                Err(e) => {
                    println!("{}", format!("❌ Failed to load user store: {}", e).red());
                    std::process::exit(1);
                }
            };

            match users.register(&username, &password, role.as_deref()) {
                Ok(()) => {
                    println!("{}", format!("✅ Registered user '{}'", username).green());
                }
                Err(e) => {
                    println!("{}", format!("❌ Registration failed: {}", e).red());
                    std::process::exit(1);
                }
            }
        }
        UserAction::Verify {
            username,
            password,
            file,
        } => {
            let users = match UserStore::load(&file) {
                Ok(users) => users,
                Err(e) => {
                    println!("{}", format!("❌ Failed to load user store: {}", e).red());
                    std::process::exit(1);
                }
            };

            if users.verify(&username, &password) {
                println!("{}", format!("✅ Credentials valid for '{}'", username).green());
            } else {
                println!("{}", "❌ Invalid username or password".red());
                std::process::exit(1);
            }
        }
    }
}

fn run_settings(action: SettingsAction) {
    match action {
        SettingsAction::Show { file } => {
            let manager = SettingsManager::load(&file);
            match serde_json::to_string_pretty(manager.settings()) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    println!("{}", format!("❌ Failed to render settings: {}", e).red());
                    std::process::exit(1);
                }
            }
        }
        SettingsAction::Get { key, file } => {
            let manager = SettingsManager::load(&file);
            match manager.get(&key) {
                Some(value) => println!("{}", value),
                None => {
                    println!("{}", format!("❌ Unknown setting '{}'", key).red());
                    std::process::exit(1);
                }
            }
        }
        SettingsAction::Set { key, value, file } => {
            let mut manager = SettingsManager::load(&file);
            match manager.set(&key, &value) {
                Ok(()) => {
                    println!("{}", format!("✅ {} = {}", key, value).green());
                }
                Err(e) => {
                    println!("{}", format!("❌ {}", e).red());
                    std::process::exit(1);
                }
            }
        }
    }
}
