use actix_web::{HttpResponse, Responder, get, post, web};

use super::models::{AppState, NewWalletResponse, WalletInfoResponse};
use crate::wallet::Wallet;

/// Address of the node wallet and its balance replayed from the local chain.
#[get("/wallet-info/")]
pub async fn wallet_info(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    let wallet = state.wallet.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(WalletInfoResponse {
        address: wallet.public_key.clone(),
        balance: Wallet::calculate_balance(&bc.chain, &wallet.public_key),
    })
}

#[post("/wallet/new/")]
pub async fn create_wallet() -> impl Responder {
    let wallet = Wallet::new();
    HttpResponse::Ok().json(NewWalletResponse {
        private_key: wallet.secret_key_hex(),
        public_key: wallet.public_key.clone(),
        address: wallet.public_key,
    })
}
