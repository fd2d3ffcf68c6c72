use anyhow::{Context, ensure};
use elliptic_keypair::{generate_private_key, generate_public_key, sign_message, verify_message};
use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hello world".to_string());

    let private_key = generate_private_key().context("generating private key")?;
    let public_key = generate_public_key(&private_key);
    let signature = sign_message(&message, &private_key).context("signing message")?;
    info!("signed {} bytes", message.len());

    println!("message:    {message}");
    println!("public key: {public_key}");
    println!("r:          {}", signature.r_hex());
    println!("s:          {}", signature.s_hex());
    println!("der:        {}", signature.to_der_hex());

    let valid = verify_message(&message, &public_key, &signature);
    println!("valid:      {valid}");
    ensure!(valid, "freshly produced signature failed to verify");

    Ok(())
}
