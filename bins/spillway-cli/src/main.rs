//! spillway-cli — allocation-tree tooling for Spillway distributions.
//!
//! Builds committed allocation trees off-line, extracts per-recipient
//! inclusion proofs, and verifies claims locally before submission. The
//! allocation table input is a JSON array of `{recipient, amount}` rows;
//! amounts are cumulative all-time totals in base units.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use spillway_core::commitment::{decode_proof, leaf_hash, verify_proof, Sha256Hasher};
use spillway_core::tree::{Allocation, AllocationTree};
use spillway_core::types::{Address, Hash256};

/// Everything an operator hands out for one committed table.
#[derive(Serialize, Deserialize)]
struct ProofBundle {
    /// Root to install via `set_merkle_root`.
    root: Hash256,
    /// Number of rows committed under the root.
    leaf_count: usize,
    /// Per-recipient claim inputs.
    proofs: Vec<ProofEntry>,
}

/// One recipient's claim inputs.
#[derive(Serialize, Deserialize)]
struct ProofEntry {
    recipient: Address,
    amount: u64,
    proof: Vec<Hash256>,
}

/// Spillway allocation-tree builder and claim prover.
#[derive(Parser)]
#[command(name = "spillway-cli")]
#[command(version, about = "Build, prove, and verify cumulative Merkle drops")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the committed root of an allocation table.
    Root(RootArgs),
    /// Write the full proof bundle for an allocation table.
    Build(BuildArgs),
    /// Print one recipient's amount and proof.
    Prove(ProveArgs),
    /// Verify a claim against a root, touching no state.
    Verify(VerifyArgs),
}

#[derive(Args)]
struct RootArgs {
    /// Path to the allocation table (JSON).
    #[arg(short, long)]
    allocations: PathBuf,
}

#[derive(Args)]
struct BuildArgs {
    /// Path to the allocation table (JSON).
    #[arg(short, long)]
    allocations: PathBuf,

    /// Output path for the proof bundle (JSON).
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Args)]
struct ProveArgs {
    /// Path to the allocation table (JSON).
    #[arg(short, long)]
    allocations: PathBuf,

    /// Recipient address (hex, optional 0x prefix).
    #[arg(short, long)]
    recipient: Address,
}

#[derive(Args)]
struct VerifyArgs {
    /// Committed root (hex).
    #[arg(long)]
    root: Hash256,

    /// Recipient address (hex, optional 0x prefix).
    #[arg(long)]
    recipient: Address,

    /// Cumulative amount in base units.
    #[arg(long)]
    amount: u64,

    /// Proof: comma-separated 32-byte hex digests, or one concatenated
    /// hex string. Omit for a single-row table.
    #[arg(long, default_value = "")]
    proof: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Root(args) => cmd_root(args),
        Commands::Build(args) => cmd_build(args),
        Commands::Prove(args) => cmd_prove(args),
        Commands::Verify(args) => cmd_verify(args),
    }
}

/// Load and commit an allocation table from a JSON file.
fn load_tree(path: &Path) -> Result<AllocationTree> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading allocation table {}", path.display()))?;
    let allocations: Vec<Allocation> =
        serde_json::from_str(&data).context("parsing allocation table")?;
    AllocationTree::from_allocations(allocations).context("committing allocation table")
}

fn cmd_root(args: RootArgs) -> Result<()> {
    let tree = load_tree(&args.allocations)?;
    println!("{}", tree.root());
    Ok(())
}

fn cmd_build(args: BuildArgs) -> Result<()> {
    let tree = load_tree(&args.allocations)?;

    let mut proofs = Vec::with_capacity(tree.len());
    for row in tree.allocations() {
        let proof = tree
            .proof_of(&row.recipient)
            .context("proof missing for committed row")?;
        proofs.push(ProofEntry {
            recipient: row.recipient,
            amount: row.amount,
            proof,
        });
    }

    let bundle = ProofBundle {
        root: tree.root(),
        leaf_count: tree.len(),
        proofs,
    };
    let json = serde_json::to_string_pretty(&bundle).context("encoding proof bundle")?;
    fs::write(&args.out, json)
        .with_context(|| format!("writing proof bundle {}", args.out.display()))?;

    println!("root {}", bundle.root);
    println!("wrote {} proofs to {}", bundle.leaf_count, args.out.display());
    Ok(())
}

fn cmd_prove(args: ProveArgs) -> Result<()> {
    let tree = load_tree(&args.allocations)?;

    let Some(amount) = tree.amount_of(&args.recipient) else {
        bail!("recipient {} is not in the allocation table", args.recipient);
    };
    let proof = tree
        .proof_of(&args.recipient)
        .context("proof missing for committed row")?;

    let entry = ProofEntry {
        recipient: args.recipient,
        amount,
        proof,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&entry).context("encoding proof entry")?
    );
    Ok(())
}

fn cmd_verify(args: VerifyArgs) -> Result<()> {
    let proof = parse_proof(&args.proof)?;
    let leaf = leaf_hash::<Sha256Hasher>(&args.recipient, args.amount);

    if !verify_proof::<Sha256Hasher>(&leaf, &proof, &args.root) {
        bail!(
            "claim ({}, {}) does not verify against root {}",
            args.recipient,
            args.amount,
            args.root
        );
    }

    println!(
        "claim ({}, {}) verifies against root {}",
        args.recipient, args.amount, args.root
    );
    Ok(())
}

/// Parse a proof argument.
///
/// Accepts comma-separated 32-byte hex digests or one concatenated hex
/// string; empty input is the empty proof. A concatenated string whose
/// length is not a multiple of 64 hex chars is a format error, reported
/// as such rather than as a verification failure.
fn parse_proof(s: &str) -> Result<Vec<Hash256>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }

    if s.contains(',') {
        return s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<Hash256>()
                    .with_context(|| format!("parsing proof digest {part:?}"))
            })
            .collect();
    }

    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).context("decoding proof hex")?;
    decode_proof(&bytes).context("malformed proof")
}
