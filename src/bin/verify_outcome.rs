//! Offline round verifier.
//!
//! Recomputes an outcome from revealed seeds without talking to the server.

use clap::Parser;
use fairplay::{
    games::types::GameKind,
    verifier::{verify, VerifyRequest},
};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fairplay-verify")]
#[command(about = "Verify a provably-fair round from its revealed seeds", long_about = None)]
struct Args {
    /// coinflip, diceroll or slots
    #[arg(long)]
    game: GameKind,

    #[arg(long)]
    server_seed: String,

    #[arg(long)]
    client_seed: String,

    #[arg(long)]
    nonce: u64,

    /// Outcome to check, e.g. `heads`, `42` or `cherry,coin,star`
    #[arg(long)]
    claimed: String,

    /// Commitment published before the round
    #[arg(long)]
    commitment: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let request = VerifyRequest {
        game_kind: args.game,
        server_seed: args.server_seed,
        client_seed: args.client_seed,
        nonce: args.nonce,
        claimed_outcome: args.claimed,
        commitment: args.commitment,
    };

    println!("🔍 Fairplay Round Verification");
    println!("==============================");
    println!("Game:  {}", request.game_kind);
    println!("Nonce: {}\n", request.nonce);

    match verify(&request) {
        Ok(verification) => {
            println!("   ✅ Outcome verified: {}", verification.outcome);
            println!("      Commitment: {}", verification.commitment);
            println!("      Digest:     {}", verification.raw_output.digest_hex);
            println!("      Draws:      {:?}", verification.raw_output.draws);
            ExitCode::SUCCESS
        }
        Err(e) if e.is_integrity_alarm() => {
            println!("   ❌ FAILED: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            println!("   ⚠️  Could not verify: {}", e);
            ExitCode::FAILURE
        }
    }
}
