use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use lp_app::{
    AppError, AppResult, EvaluationConfig, ExpansionInputs, evaluation_service, model_service,
    write_rows, write_signal,
};
use lp_model::{LoopKind, StepOptions, frequency, pd};
use lp_signal::{
    ChirpGenerator, FrequencyResponse, SignalSpec, SineGenerator, StepEvaluation, StepGenerator,
    StepParams, StepTargets,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "lp-cli")]
#[command(about = "loopeval CLI - control loop evaluation from models and logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print numerator and denominator coefficients of a loop transfer function
    Model {
        /// Model description (JSON or YAML)
        model: PathBuf,
        /// ps, ls, ws or eds
        kind: LoopKind,
    },
    /// Print a Bode table over the default sweep
    Bode {
        model: PathBuf,
        kind: LoopKind,
        /// Number of log-spaced points
        #[arg(long, default_value_t = 200)]
        points: usize,
    },
    /// Gain and phase margins
    Margins { model: PathBuf, kind: LoopKind },
    /// Poles and zeros
    Poles { model: PathBuf, kind: LoopKind },
    /// Step metrics of the simulated step response
    StepSim {
        model: PathBuf,
        kind: LoopKind,
        /// Simulation horizon in seconds (picked from the slowest pole if omitted)
        #[arg(long)]
        t_end: Option<f64>,
        #[arg(long, default_value_t = 1000)]
        samples: usize,
    },
    /// Kp, Ki and Kd for the model's pd_args
    Pd { model: PathBuf },
    /// Merge a model manifest into one model description
    Merge {
        /// Directory holding plants/, controllers/ and constants/
        base_dir: PathBuf,
        manifest: PathBuf,
        output: PathBuf,
    },
    /// Expand constant sources into plain numbers
    Expand {
        /// KEY value parameter file
        params: PathBuf,
        /// JSON document addressed by json: paths
        document: PathBuf,
        /// Name to source mapping
        config: PathBuf,
        output: PathBuf,
    },
    /// Gain and phase at the configured frequency, one line per config
    Freq {
        #[arg(required = true)]
        configs: Vec<PathBuf>,
        /// Also write the rows as a CSV Bode table
        #[arg(long)]
        table: Option<PathBuf>,
        /// Compare against this model's response
        #[arg(long, requires = "kind")]
        model: Option<PathBuf>,
        #[arg(long)]
        kind: Option<LoopKind>,
    },
    /// Step-response evaluation of the output log, or of each --log given
    Step {
        config: PathBuf,
        #[arg(long = "log")]
        logs: Vec<PathBuf>,
    },
    /// Write a test-signal CSV
    Generate {
        signal: SignalKind,
        /// Sample interval in seconds
        #[arg(long, default_value_t = 0.01)]
        interval: f64,
        /// Run length in seconds
        #[arg(long)]
        total_time: f64,
        /// Sine frequency in Hz
        #[arg(long, default_value_t = 1.0)]
        frequency: f64,
        #[arg(long, default_value_t = 1.0)]
        amplitude: f64,
        /// Chirp start frequency in Hz
        #[arg(long, default_value_t = 0.0)]
        f0: f64,
        /// Chirp end frequency in Hz
        #[arg(long, default_value_t = 1.0)]
        f1: f64,
        #[arg(long, default_value_t = 0.0)]
        offset: f64,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SignalKind {
    Sine,
    Chirp,
    Step,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Model { model, kind } => cmd_model(&model, kind),
        Commands::Bode {
            model,
            kind,
            points,
        } => cmd_bode(&model, kind, points),
        Commands::Margins { model, kind } => cmd_margins(&model, kind),
        Commands::Poles { model, kind } => cmd_poles(&model, kind),
        Commands::StepSim {
            model,
            kind,
            t_end,
            samples,
        } => cmd_step_sim(&model, kind, StepOptions { t_end, samples }),
        Commands::Pd { model } => cmd_pd(&model),
        Commands::Merge {
            base_dir,
            manifest,
            output,
        } => cmd_merge(&base_dir, &manifest, &output),
        Commands::Expand {
            params,
            document,
            config,
            output,
        } => cmd_expand(
            ExpansionInputs {
                params,
                document,
                config,
            },
            &output,
        ),
        Commands::Freq {
            configs,
            table,
            model,
            kind,
        } => {
            let reference = match (model, kind) {
                (Some(model), Some(kind)) => Some((model, kind)),
                _ => None,
            };
            cmd_freq(&configs, table.as_deref(), reference)
        }
        Commands::Step { config, logs } => cmd_step(&config, &logs),
        Commands::Generate {
            signal,
            interval,
            total_time,
            frequency,
            amplitude,
            f0,
            f1,
            offset,
            out,
        } => {
            let spec = match signal {
                SignalKind::Sine => SignalSpec::Sine(SineGenerator {
                    frequency,
                    amplitude,
                    offset,
                }),
                SignalKind::Chirp => SignalSpec::Chirp(ChirpGenerator { f0, f1, offset }),
                SignalKind::Step => SignalSpec::Step(StepGenerator { offset }),
            };
            cmd_generate(&spec, interval, total_time, &out)
        }
    }
}

fn cmd_model(path: &Path, kind: LoopKind) -> AppResult<()> {
    let tf = model_service::open_model(path)?.select(kind)?;
    let (num, den) = tf.coefficients();
    println!("num:  {num:?}");
    println!("den:  {den:?}");
    println!("{kind}(s) = ({}) / ({})", tf.num(), tf.den());
    Ok(())
}

fn cmd_bode(path: &Path, kind: LoopKind, points: usize) -> AppResult<()> {
    let tf = model_service::open_model(path)?.select(kind)?;
    println!("omega_rad_s, magnitude_db, phase_deg");
    for p in frequency::bode_default(&tf, points)? {
        println!(
            "{:.6}, {:.3}, {:.3}",
            p.omega_rad_s, p.magnitude_db, p.phase_deg
        );
    }
    Ok(())
}

fn cmd_margins(path: &Path, kind: LoopKind) -> AppResult<()> {
    let tf = model_service::open_model(path)?.select(kind)?;
    let m = frequency::margins(&tf)?;
    println!("Gain margin:     {} dB", or_inf(m.gain_margin_db, 3));
    println!("Phase margin:    {} deg", or_inf(m.phase_margin_deg, 3));
    println!("Phase crossover: {} rad/s", or_na(m.phase_crossover_rad_s, 4));
    println!("Gain crossover:  {} rad/s", or_na(m.gain_crossover_rad_s, 4));
    Ok(())
}

fn cmd_poles(path: &Path, kind: LoopKind) -> AppResult<()> {
    let tf = model_service::open_model(path)?.select(kind)?;
    for p in lp_model::poles(&tf) {
        println!("pole: Real={:.4}, Imag={:.4}", p.re, p.im);
    }
    for z in lp_model::zeros(&tf) {
        println!("zero: Real={:.4}, Imag={:.4}", z.re, z.im);
    }
    let verdict = if lp_model::is_stable(&tf) { "stable" } else { "not stable" };
    println!("{kind} is {verdict}");
    Ok(())
}

fn cmd_step_sim(path: &Path, kind: LoopKind, opts: StepOptions) -> AppResult<()> {
    let tf = model_service::open_model(path)?.select(kind)?;
    let m = evaluation_service::analytic_step_metrics(&tf, opts, &StepParams::default())?;
    if !m.stable {
        println!("Variance is too high. Steady state value is unstable.");
    }
    println!("Steady-State Value: {:.3}", m.steady_state);
    println!("Overshoot: {}", or_na(m.overshoot, 3));
    println!("Rise Time (10%-90%): {} s", or_na(m.rise_time, 3));
    println!("Delay Time (50%): {} s", or_na(m.delay_time, 3));
    println!("Settling Time (within ±5%): {} s", or_na(m.settling_time, 3));
    Ok(())
}

fn cmd_pd(path: &Path) -> AppResult<()> {
    let model = model_service::open_model(path)?;
    let args = model
        .pd_args()
        .copied()
        .ok_or_else(|| AppError::Config(format!("{}: no pd_args", path.display())))?;
    let gains = pd::solve_from_args(&model.plant()?, &args)?;
    println!("\"Kp\": {},", gains.kp);
    println!("\"Ki\": {},", gains.ki);
    println!("\"Kd\": {},", gains.kd);
    Ok(())
}

fn cmd_merge(base_dir: &Path, manifest: &Path, output: &Path) -> AppResult<()> {
    let model = model_service::merge_manifest_file(base_dir, manifest)?;
    model_service::save_model(output, &model)?;
    println!("✓ Merged model written to {}", output.display());
    Ok(())
}

fn cmd_expand(inputs: ExpansionInputs, output: &Path) -> AppResult<()> {
    let expanded = model_service::expand_constant_files(&inputs)?;
    model_service::write_document(output, &expanded)?;
    println!("✓ {} constants written to {}", expanded.len(), output.display());
    Ok(())
}

fn cmd_freq(
    configs: &[PathBuf],
    table: Option<&Path>,
    reference: Option<(PathBuf, LoopKind)>,
) -> AppResult<()> {
    let loaded = configs
        .iter()
        .map(|p| EvaluationConfig::load(p))
        .collect::<AppResult<Vec<_>>>()?;

    let mut responses: Vec<FrequencyResponse> = Vec::with_capacity(loaded.len());
    for (path, result) in configs
        .iter()
        .zip(evaluation_service::evaluate_frequency_batch(&loaded))
    {
        match result {
            Ok(r) => {
                print_freq_line(&r);
                responses.push(r);
            }
            Err(e) => eprintln!("{}: {e}", path.display()),
        }
    }

    if let Some((model, kind)) = reference {
        let tf = model_service::open_model(&model)?.select(kind)?;
        for r in &responses {
            if let Some(p) = evaluation_service::model_point(&tf, r.frequency_hz) {
                println!(
                    "model {kind} at {}: {:.2} dB, {:.2} deg",
                    r.frequency_hz, p.magnitude_db, p.phase_deg
                );
            }
        }
    }

    if let Some(path) = table {
        write_rows(path, &evaluation_service::sweep_rows(&responses))?;
        info!(path = %path.display(), rows = responses.len(), "Bode table written");
    }
    Ok(())
}

fn print_freq_line(r: &FrequencyResponse) {
    let phase = r
        .phase_deg
        .map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}"));
    println!(
        "{}, {:.2}, {:.2}, {}, {:.2}, {:.2}",
        r.frequency_hz,
        r.frequency_hz.log10(),
        r.gain_db,
        phase,
        r.input_phase_deg,
        r.output_phase_deg
    );
}

fn cmd_step(config_path: &Path, logs: &[PathBuf]) -> AppResult<()> {
    let config = EvaluationConfig::load(config_path)?;
    let step = config.step()?;

    if logs.is_empty() {
        let eval = evaluation_service::evaluate_step(&config)?;
        print_step(&eval, &step.target_params);
        return Ok(());
    }

    let results = evaluation_service::evaluate_step_batch(step, logs);
    let mut failed = 0usize;
    for (path, result) in logs.iter().zip(results) {
        println!("== {} ==", path.display());
        match result {
            Ok(eval) => print_step(&eval, &step.target_params),
            Err(e) => {
                failed += 1;
                println!("error: {e}");
            }
        }
    }
    if failed > 0 {
        println!("{failed} of {} logs could not be evaluated", logs.len());
    }
    Ok(())
}

fn print_step(eval: &StepEvaluation, t: &StepTargets) {
    if !eval.stable {
        println!("Variance is too high. Steady state value is unstable.");
    }
    println!(
        "{} c(Steady state value)  : {}   (Target: {}±{:.3} m)",
        eval.steady_state.verdict,
        or_na(eval.steady_state.value, 3),
        t.value,
        t.value * t.cv
    );
    println!(
        "{} T_r(Rise time)         : {} s (Target: ≤ {:.3} s)",
        eval.rise_time.verdict,
        or_na(eval.rise_time.value, 3),
        t.rise_time
    );
    println!(
        "{} T_d(Delay time)        : {} s (Target: ≤ {:.3} s)",
        eval.delay_time.verdict,
        or_na(eval.delay_time.value, 3),
        t.delay_time
    );
    println!(
        "{} O_s(Maximum overshoot) : {}   (Target: ≤ {:.3} m)",
        eval.overshoot.verdict,
        or_na(eval.overshoot.value, 3),
        t.overshoot
    );
    println!(
        "{} T_s(5% settling time)  : {} s (Target: ≤ {:.3} s)",
        eval.settling_time.verdict,
        or_na(eval.settling_time.value, 3),
        t.settling_time
    );
}

fn cmd_generate(spec: &SignalSpec, interval: f64, total_time: f64, out: &Path) -> AppResult<()> {
    let values = spec.generate(interval, total_time)?;
    write_signal(out, interval, &values)?;
    println!("✓ {} samples written to {}", values.len(), out.display());
    Ok(())
}

fn or_na(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

fn or_inf(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "∞".to_string(), |v| format!("{v:.precision$}"))
}
