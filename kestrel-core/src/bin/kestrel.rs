use std::time::Instant;

use anyhow::{bail, Context, Result};
use ark_ff::PrimeField;
use clap::Parser;
use kestrel_core::frontend::{Api, Assignment, Circuit, CircuitError};
use kestrel_core::utils::logging::init_logging;
use kestrel_core::{backend, BackendId, CurveId, CurveWitness, ProverOptions};
use rand::rngs::OsRng;

/// Proves `x² == y` for a public `y` and secret `x`, repeated `--iterations` times.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[clap(long, default_value = "bn254")]
    curve: CurveId,

    #[clap(long, default_value = "groth16")]
    backend: BackendId,

    /// Secret input
    #[clap(short, default_value_t = 6)]
    x: i64,

    /// Public input
    #[clap(short, default_value_t = 36)]
    y: i64,

    /// Number of squarings chained before the final check
    #[clap(long, default_value_t = 1)]
    depth: usize,

    #[clap(long, default_value_t = 1)]
    iterations: usize,

    /// Prove without checking the witness (benchmarking only, the proof will not verify)
    #[clap(long)]
    force: bool,

    /// Write the proof to this path
    #[clap(long)]
    proof_out: Option<std::path::PathBuf>,
}

/// `x^(2^depth) == y`.
struct Square {
    depth: usize,
}

impl Circuit for Square {
    fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
        let y = api.public_input("y")?;
        let mut acc = api.secret_input("x")?;
        for _ in 0..self.depth {
            acc = api.mul(&acc, &acc);
        }
        api.assert_is_equal(&acc, &y)
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    if !cli.curve.has_pairing() {
        bail!("{} has no pairing, no backend can prove over it", cli.curve);
    }

    let circuit = Square { depth: cli.depth };
    let ccs = backend::compile(cli.curve, cli.backend, &circuit).context("compiling circuit")?;
    tracing::info!(
        curve = %cli.curve,
        backend = %cli.backend,
        nb_constraints = ccs.nb_constraints(),
        "compiled"
    );

    let assignment = Assignment::new().with("x", cli.x).with("y", cli.y);
    let witness = CurveWitness::from_assignment(cli.curve, ccs.schema(), &assignment)
        .context("building witness")?;

    let start = Instant::now();
    let (pk, vk) = backend::setup(&ccs).context("setup")?;
    tracing::info!(elapsed = ?start.elapsed(), "setup done");

    let options = ProverOptions::new();
    for i in 0..cli.iterations {
        let start = Instant::now();
        let proof = if cli.force {
            backend::prove_unchecked(&ccs, &pk, &witness, &options, &mut OsRng)
        } else {
            backend::prove(&ccs, &pk, &witness, &options)
        }
        .context("proving")?;
        tracing::info!(iteration = i, elapsed = ?start.elapsed(), "proved");

        match backend::verify(&proof, &vk, &witness.public_only()) {
            Ok(()) => tracing::info!(iteration = i, "proof verified"),
            Err(err) if cli.force => tracing::warn!(iteration = i, %err, "forced proof rejected"),
            Err(err) => return Err(err).context("verifying"),
        }

        if let Some(path) = &cli.proof_out {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let bytes = proof.write_to(std::io::BufWriter::new(file))?;
            tracing::info!(path = %path.display(), bytes, "proof written");
        }
    }
    Ok(())
}
