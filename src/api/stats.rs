use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};
use crate::blockchain::MINE_RATE_MS;

/// Block timing against the target mine rate.
#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let (height, difficulty, last_interval, avg_interval) = {
        let bc = state.blockchain.lock().expect("mutex poisoned");

        // The genesis timestamp is a constant, so intervals start at block 1.
        // Adopted blocks carry peer timestamps, hence the saturating math.
        let intervals: Vec<i64> = bc.chain[1..]
            .windows(2)
            .map(|pair| pair[1].timestamp.saturating_sub(pair[0].timestamp).max(0))
            .collect();

        let last = intervals.last().copied();
        let avg = if intervals.is_empty() {
            None
        } else {
            let total: i128 = intervals.iter().map(|&ms| i128::from(ms)).sum();
            Some(total as f64 / intervals.len() as f64)
        };
        (bc.len(), bc.difficulty(), last, avg)
    };

    let pool_size = {
        let pool = state.transaction_pool.lock().expect("mutex poisoned");
        pool.len()
    };

    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty,
        mine_rate_ms: MINE_RATE_MS,
        last_interval_ms: last_interval,
        avg_interval_ms: avg_interval,
        pool_size,
    })
}
