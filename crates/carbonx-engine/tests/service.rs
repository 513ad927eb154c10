//! Concurrent callers through the exchange service.

use carbonx_custody::AllowAll;
use carbonx_engine::{Engine, ExchangeService, TradeJournal, invariants};
use carbonx_types::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_handles_are_serialized() {
    let engine = Engine::new(
        EngineConfig::default(),
        Box::new(AllowAll),
        TradeJournal::new(),
    )
    .unwrap();
    let (handle, worker) = ExchangeService::spawn(engine);

    let mut tasks = Vec::new();
    for i in 0..8u128 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            let seller = AccountId::new(format!("s{i}"));
            let buyer = AccountId::new(format!("b{i}"));
            handle
                .execute(seller.clone(), Command::DepositCommodity { amount: 10 })
                .await
                .unwrap();
            let ask = handle
                .execute(seller, Command::PlaceAsk {
                    amount: 10,
                    price: 5 + i % 3,
                })
                .await
                .unwrap();
            let bid = handle
                .execute(buyer, Command::PlaceBid {
                    amount: 10,
                    price: 7,
                    funding: 70,
                })
                .await
                .unwrap();
            [ask, bid]
        }));
    }

    let mut traded = 0;
    for task in tasks {
        for receipt in task.await.unwrap() {
            traded += receipt.trades().map(|t| t.quantity).sum::<u128>();
        }
    }
    // Every bid at 7 crosses every ask priced 5..=7, whichever arrives first.
    assert_eq!(traded, 80);
    assert!(handle.depth(Side::Ask, 10).await.unwrap().is_empty());

    drop(handle);
    let engine = worker.await.unwrap();
    invariants::verify_all(engine.ledger(), engine.book(), engine.supply()).unwrap();
    assert!(engine.book().is_empty());
    assert_eq!(engine.ledger().total_supply(Asset::Currency), 8 * 70);
    assert_eq!(engine.ledger().total_supply(Asset::Commodity), 80);
    assert!(engine.sink().verify());
    assert_eq!(engine.sink().trades().map(|t| t.quantity).sum::<u128>(), 80);
}
