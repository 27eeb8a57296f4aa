//! CLI for openbell — device-independent quantum handshake.

use clap::{Args, Parser, Subcommand, ValueEnum};

use openbell_core::{
    Dispatcher, ExecutorConfig, Handshake, LocalSimulator, ProtocolOutcome, protocols,
};

#[derive(Parser)]
#[command(name = "openbell")]
#[command(about = "openbell — verify that a pair of quantum devices is actually quantum")]
#[command(version = openbell_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Repetitions per experiment
    #[arg(long, default_value_t = 1000)]
    shots: u32,

    /// RNG seed for the local simulator (omit for OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Emit the verdict as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    /// One job per basis-pair setting
    Single,
    /// Two Bell pairs packed into one 4-register experiment
    Parallel,
}

#[derive(Clone, Copy, ValueEnum)]
enum Check {
    /// Pass iff |S - 2√2| <= tolerance
    Maximal,
    /// Pass iff S - 2 > tolerance
    Violation,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all three protocols and aggregate with logical AND
    Handshake {
        #[command(flatten)]
        run: RunArgs,

        /// Passing tolerance applied to every protocol
        #[arg(long, default_value_t = 0.3)]
        tolerance: f64,
    },

    /// Check that the channel carries two genuine registers
    Dimensionality {
        #[command(flatten)]
        run: RunArgs,

        /// Allowed deviation of the success probability from 1
        #[arg(long, default_value_t = 0.1)]
        tolerance: f64,
    },

    /// CHSH entanglement test
    Entanglement {
        #[command(flatten)]
        run: RunArgs,

        /// Tolerance for the selected check
        #[arg(long, default_value_t = 0.2)]
        tolerance: f64,

        #[arg(long, value_enum, default_value_t = Variant::Single)]
        variant: Variant,

        #[arg(long, value_enum, default_value_t = Check::Maximal)]
        check: Check,
    },

    /// Measurement-incompatibility test (BB84 facet)
    Incompatibility {
        #[command(flatten)]
        run: RunArgs,

        /// Required violation beyond the classical bound
        #[arg(long, default_value_t = 0.5)]
        tolerance: f64,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(passed) => {
            if !passed {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> openbell_core::Result<bool> {
    match cli.command {
        Commands::Handshake { run, tolerance } => {
            let handshake = Handshake::new(dispatcher(&run));
            let report = handshake.test_all(tolerance, run.shots)?;
            if run.json {
                println!("{}", serde_json::to_string_pretty(&report).unwrap());
            } else {
                for result in &report.results {
                    print_verdict(&result.protocol, result.passed, result.value);
                }
                println!(
                    "handshake: {}",
                    if report.all_passed { "PASSED" } else { "FAILED" }
                );
            }
            Ok(report.all_passed)
        }
        Commands::Dimensionality { run, tolerance } => {
            let outcome = protocols::dimension::run_test(&dispatcher(&run), tolerance, run.shots)?;
            report_one("dimensionality", &run, &outcome);
            Ok(outcome.passed)
        }
        Commands::Entanglement {
            run,
            tolerance,
            variant,
            check,
        } => {
            let d = dispatcher(&run);
            let outcome = match (variant, check) {
                (Variant::Single, Check::Maximal) => {
                    protocols::entanglement::run_test(&d, tolerance, run.shots)?
                }
                (Variant::Single, Check::Violation) => {
                    protocols::entanglement::run_violation_test(&d, tolerance, run.shots)?
                }
                (Variant::Parallel, Check::Maximal) => {
                    protocols::entanglement::run_parallel_test(&d, tolerance, run.shots)?
                }
                (Variant::Parallel, Check::Violation) => {
                    return Err(openbell_core::Error::InvalidSetting {
                        name: "check",
                        value: 1,
                        allowed: "maximal (for --variant parallel)",
                    });
                }
            };
            report_one("entanglement", &run, &outcome);
            Ok(outcome.passed)
        }
        Commands::Incompatibility { run, tolerance } => {
            let outcome =
                protocols::incompatibility::run_test(&dispatcher(&run), tolerance, run.shots)?;
            report_one("measurement incompatibility", &run, &outcome);
            Ok(outcome.passed)
        }
    }
}

fn dispatcher(run: &RunArgs) -> Dispatcher {
    let simulator = LocalSimulator::new(ExecutorConfig {
        seed: run.seed,
        ..ExecutorConfig::default()
    });
    Dispatcher::new(Box::new(simulator))
}

fn report_one(name: &str, run: &RunArgs, outcome: &ProtocolOutcome) {
    if run.json {
        println!("{}", serde_json::to_string_pretty(outcome).unwrap());
    } else {
        print_verdict(name, outcome.passed, outcome.value);
    }
}

fn print_verdict(name: &str, passed: bool, value: f64) {
    if passed {
        println!("passed {name} with value {value:.4}");
    } else {
        println!("failed {name} with value {value:.4}");
    }
}
