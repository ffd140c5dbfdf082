mod balance;
mod chain;
mod health;
mod mining;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_blocks)
            .service(chain::validate_chain)
            .service(chain::mine_block)
            .service(chain::replace_chain)
            .service(mining::mine_transactions)
            .service(tx::post_transact)
            .service(tx::get_pool_map)
            .service(tx::put_pool_map)
            .service(balance::get_balance)
            .service(stats::get_stats)
            .service(wallet::wallet_info)
            .service(wallet::create_wallet),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{Block, BlockData, Blockchain, STARTING_BALANCE};
    use crate::transaction::Transaction;
    use crate::wallet::Wallet;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::default())
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .configure(init_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn blocks_start_at_genesis() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/v1/blocks/").to_request();
        let blocks: Vec<Block> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(blocks, vec![Block::genesis()]);
    }

    #[actix_web::test]
    async fn transact_twice_merges_into_one_pending_transaction() {
        let state = state();
        let app = app!(state);

        for (recipient, amount) in [("alice", 10), ("bob", 20)] {
            let req = test::TestRequest::post()
                .uri("/api/v1/transact/")
                .set_json(json!({ "recipient": recipient, "amount": amount }))
                .to_request();
            let resp: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(resp["type"], "success");
        }

        let pool = state.transaction_pool.lock().unwrap();
        assert_eq!(pool.len(), 1);
        let tx = pool.transactions().values().next().unwrap();
        assert_eq!(tx.output_map["alice"], 10);
        assert_eq!(tx.output_map["bob"], 20);
        assert!(tx.is_valid());
    }

    #[actix_web::test]
    async fn overspending_is_a_bad_request() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/transact/")
            .set_json(json!({ "recipient": "alice", "amount": STARTING_BALANCE + 1 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["type"], "error");
        assert!(state.transaction_pool.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn mine_transactions_seals_the_pool() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/transact/")
            .set_json(json!({ "recipient": "alice", "amount": 40 }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::post()
            .uri("/api/v1/mine-transactions/")
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["mined_index"], 1);
        assert_eq!(resp["transactions"], 2);

        assert!(state.transaction_pool.lock().unwrap().is_empty());
        assert_eq!(state.blockchain.lock().unwrap().len(), 2);

        let req = test::TestRequest::get().uri("/api/v1/wallet-info/").to_request();
        let info: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(info["balance"], STARTING_BALANCE - 40 + crate::blockchain::MINING_REWARD);
    }

    #[actix_web::test]
    async fn mine_with_raw_data() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(json!({ "data": "foo-bar" }))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["mined_index"], 1);

        let bc = state.blockchain.lock().unwrap();
        assert_eq!(bc.last_block().data, BlockData::Raw(json!("foo-bar")));
        assert!(Blockchain::is_valid_chain(&bc.chain));
    }

    #[actix_web::test]
    async fn chain_sync_adopts_longer_and_purges_pool() {
        let state = state();
        let app = app!(state);

        let mut sender = Wallet::new();
        let settled = sender.create_transaction("alice", 10, None).unwrap();
        let pending = Wallet::new().create_transaction("bob", 5, None).unwrap();
        {
            let mut pool = state.transaction_pool.lock().unwrap();
            pool.set_transaction(settled.clone());
            pool.set_transaction(pending.clone());
        }

        let mut remote = Blockchain::new();
        remote.add_block(BlockData::Transactions(vec![settled.clone()]));

        let req = test::TestRequest::post()
            .uri("/api/v1/chain/replace/")
            .set_json(&remote.chain)
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["accepted"], true);
        assert_eq!(resp["outcome"], "replaced");

        let pool = state.transaction_pool.lock().unwrap();
        assert!(pool.get(&settled.id).is_none());
        assert!(pool.get(&pending.id).is_some());
        assert_eq!(state.blockchain.lock().unwrap().chain, remote.chain);
    }

    #[actix_web::test]
    async fn chain_sync_rejects_equal_length() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/chain/replace/")
            .set_json(vec![Block::genesis()])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["outcome"], "not_longer");
    }

    #[actix_web::test]
    async fn pool_sync_overwrites_the_map() {
        let state = state();
        let app = app!(state);

        let stale = Wallet::new().create_transaction("old", 1, None).unwrap();
        state
            .transaction_pool
            .lock()
            .unwrap()
            .set_transaction(stale.clone());

        let fresh = Wallet::new().create_transaction("new", 2, None).unwrap();
        let mut snapshot: HashMap<String, Transaction> = HashMap::new();
        snapshot.insert(fresh.id.clone(), fresh.clone());

        let req = test::TestRequest::put()
            .uri("/api/v1/transaction-pool-map/")
            .set_json(&snapshot)
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri("/api/v1/transaction-pool-map/")
            .to_request();
        let map: HashMap<String, Transaction> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&fresh.id), Some(&fresh));
        assert!(!map.contains_key(&stale.id));
    }

    #[actix_web::test]
    async fn balance_of_an_unknown_address_is_the_starting_balance() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/v1/balance/nobody/")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["address"], "nobody");
        assert_eq!(body["balance"], STARTING_BALANCE);
    }
}
