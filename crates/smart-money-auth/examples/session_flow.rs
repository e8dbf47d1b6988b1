/*
[INPUT]:  A generated keypair wallet and an in-process verifier
[OUTPUT]: Printed session token and request headers
[POS]:    Examples - session flow demonstration
[UPDATE]: When the auth flow changes
*/

use std::sync::Arc;

use smart_money_auth::*;

/// Example: Session flow
///
/// 1. Generate a keypair wallet
/// 2. Wire a broker to an in-process verifier
/// 3. Fetch headers twice (the second call reuses the cached session)
/// 4. Disconnect and watch the cache clear
#[tokio::main]
async fn main() {
    println!("=== Wallet Session Example ===\n");

    let wallet = KeypairWallet::generate();
    println!("✓ Wallet: {}", wallet.address());

    let verifier = Arc::new(SessionVerifier::default());
    let broker = SessionBroker::new(verifier.clone(), SessionCache::in_memory());

    for attempt in 1..=2 {
        match broker.get_auth_headers(&wallet).await {
            Ok(headers) => {
                println!("\nAttempt {attempt}:");
                for (name, value) in headers.pairs() {
                    println!("  {name}: {value}");
                }
            }
            Err(e) => {
                eprintln!("✗ Failed to get headers: {}", e);
                return;
            }
        }
    }
    println!("\n✓ Active sessions on verifier: {}", verifier.registry().active_sessions());

    wallet.disconnect();
    broker.on_wallet_event(&WalletEvent::Disconnected);
    println!("✓ Cache after disconnect: {:?}", broker.cache().load());

    match broker.get_auth_headers(&wallet).await {
        Ok(_) => println!("✗ Unexpected headers for a disconnected wallet"),
        Err(e) => println!("✓ Disconnected wallet refused: {}", e),
    }
}
