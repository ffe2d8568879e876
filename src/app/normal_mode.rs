use std::{ sync::Arc, time::Duration };

use crate::{
    app::{ bootstrap, keepalive::run_keepalive },
    arbitrage::{
        detector::{ Detector, DetectorSettings },
        spread::{ SpreadMonitor, SpreadSettings },
    },
    config::Config,
    exchange::{
        binance::BinanceClient,
        client::ExchangeClient,
        endpoints::Endpoints,
        paper::PaperExchange,
    },
    executor::sequencer::{ Phase, SequencerSettings, TradeSequencer },
    market::{
        account::AccountHandler,
        feed::{ wait_for_shutdown, FeedConnector, FeedError, FeedSupervisor, ReconnectPolicy },
        store::PriceStore,
        ticker::{ BookTickerHandler, QuoteListener },
        websocket::WsConnector,
    },
    models::symbol_map::Generated,
    monitor::{ jsonl_store::JsonLinesStore, sink::{ run_flusher, FlushSettings, OpportunitySink } },
    utils::console::{ print_app_started, print_app_starting, print_config },
    API_TIMEOUT,
};
use anyhow::{ anyhow, Context, Result };
use tokio::{ sync::watch, task::JoinSet };
use tracing::{ error, info, warn };

const SINK_CAPACITY: usize = 4096;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

type StreamResult = (Arc<str>, Result<(), FeedError>);

pub fn run_normal_mode(config: Config) -> Result<()> {
    print_app_starting();
    print_config(&config);

    let endpoints = Endpoints::new(&config.rest_url, &config.ws_url)?;
    let client: Arc<dyn ExchangeClient> = Arc::new(
        BinanceClient::new(endpoints.clone(), &config.api_key, &config.secret_key)
    );

    info!("Connecting to exchange: {}", client.name());

    let rt = tokio::runtime::Builder
        ::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    // Bootstrap failures end the process
    let generated = rt.block_on(bootstrap::load_triangles(client.as_ref(), &config))?;
    bootstrap::log_sample(&generated, 5);

    let wallet = rt.block_on(bootstrap::load_wallet(client.as_ref()))?;
    let store = bootstrap::seed_store(&generated, &wallet);

    info!("✓ Seeded price store with {} symbols and {} balances", store.symbol_count(), wallet.len());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let ctrlc_tx = shutdown_tx.clone();

    ctrlc
        ::set_handler(move || {
            info!("Received Ctrl+C, shutting down...");
            let _ = ctrlc_tx.send(true);
        })
        .context("Error setting Ctrl-C handler")?;

    rt.block_on(supervise(config, endpoints, client, store, generated, shutdown_tx, shutdown_rx))?;

    info!("Triangular arbitrage system stopped");
    Ok(())
}

async fn supervise(
    config: Config,
    endpoints: Endpoints,
    client: Arc<dyn ExchangeClient>,
    store: Arc<PriceStore>,
    generated: Generated,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>
) -> Result<()> {
    let Generated { triangles, tracked } = generated;

    let trading_client: Arc<dyn ExchangeClient> = if config.paper_trading {
        info!("Paper trading enabled, orders fill at the local top of book");
        Arc::new(PaperExchange::new(client.clone(), store.clone()))
    } else {
        warn!("Paper trading disabled, orders go to the exchange");
        client.clone()
    };

    let (sink, records) = OpportunitySink::channel(SINK_CAPACITY);
    let flusher = tokio::spawn(
        run_flusher(
            records,
            JsonLinesStore::new(&config.opportunities.file),
            FlushSettings {
                batch_size: config.opportunities.batch,
                interval: Duration::from_secs(config.opportunities.flush_secs.max(1)),
            },
            shutdown_rx.clone()
        )
    );

    let sequencer = Arc::new(
        TradeSequencer::new(trading_client, store.clone(), sink.clone(), SequencerSettings {
            fee_kind: config.fee_kind,
            trade_amount: config.trade_amount,
            cooldown: config.cooldown(),
        })
    );

    let spread = config.spread.enabled.then(|| {
        SpreadMonitor::new(
            SpreadSettings {
                quote: config.spread.quote.clone(),
                peers: config.spread.peers.clone(),
                fee: config.fee,
                conversion: config.spread.conversion,
                threshold: config.spread.threshold,
            },
            &tracked
        )
    });

    let detector = Arc::new(
        Detector::new(triangles, store.clone(), sequencer.clone(), sink, spread, DetectorSettings {
            fee_kind: config.fee_kind,
            min_profit: config.min_profit,
        })
    );

    info!(
        "Created event-driven detector over {} triangles, trading above a yield of {:.4}",
        detector.triangles().len(),
        1.0 + config.min_profit
    );

    let stats = {
        let detector = detector.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { detector.run_stats_task(shutdown).await })
    };

    let connector: Arc<dyn FeedConnector> = Arc::new(WsConnector);
    let policy = ReconnectPolicy {
        max_attempts: config.reconnect_max_attempts,
        delay: config.reconnect_delay(),
    };

    // One task per tracked symbol, each owning its ticker and handler
    let mut streams: JoinSet<StreamResult> = JoinSet::new();
    for symbol in &tracked {
        let name = symbol.ticker.clone();
        let url = endpoints.book_ticker_stream(&name)?;
        let listener: Arc<dyn QuoteListener> = detector.clone();
        let supervisor = FeedSupervisor::new(
            name.clone(),
            url,
            connector.clone(),
            BookTickerHandler::new(name.clone(), listener),
            policy,
            shutdown_rx.clone()
        );
        streams.spawn(async move { (name, supervisor.run().await) });
    }

    info!("Started {} book ticker streams", tracked.len());

    // Paper balances live only in the local store, so the account stream is real-trading only
    let keepalive = if config.paper_trading {
        None
    } else {
        let token = match tokio::time::timeout(API_TIMEOUT, client.fetch_session_token()).await {
            Ok(Ok(token)) => token,
            Ok(Err(e)) => {
                return Err(anyhow!("Failed to fetch session token: {}", e));
            }
            Err(_) => {
                return Err(anyhow!("Timed out while fetching session token"));
            }
        };

        let name: Arc<str> = Arc::from("account");
        let supervisor = FeedSupervisor::new(
            name.clone(),
            endpoints.user_stream(&token)?,
            connector.clone(),
            AccountHandler::new(store.clone()),
            policy,
            shutdown_rx.clone()
        );
        streams.spawn(async move { (name, supervisor.run().await) });

        Some(
            tokio::spawn(
                run_keepalive(client.clone(), token, config.keepalive_interval(), shutdown_rx.clone())
            )
        )
    };

    print_app_started();
    info!("\nPress Ctrl+C to exit");

    let mut shutdown = shutdown_rx.clone();
    loop {
        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            joined = streams.join_next() => match joined {
                Some(joined) => log_stream_exit(joined),
                None => {
                    warn!("Every stream has stopped, shutting down");
                    break;
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);

    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(joined) = streams.join_next().await {
            log_stream_exit(joined);
        }
        // let an in-flight sequence reach its cooldown instead of cutting it between legs
        while sequencer.phase() == Phase::Trading {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }).await;
    if drained.is_err() {
        warn!("Streams or trade sequence still busy after {:?}", SHUTDOWN_GRACE);
        streams.abort_all();
    }

    match flusher.await {
        Ok(committed) => info!("Committed {} opportunity records", committed),
        Err(e) => error!("Opportunity flusher failed: {}", e),
    }
    if let Err(e) = stats.await {
        error!("Stats task failed: {}", e);
    }
    if let Some(keepalive) = keepalive {
        match keepalive.await {
            Ok(failures) if failures > 0 => warn!("{} session renewals failed", failures),
            Ok(_) => {}
            Err(e) => error!("Keepalive task failed: {}", e),
        }
    }

    Ok(())
}

fn log_stream_exit(joined: Result<StreamResult, tokio::task::JoinError>) {
    match joined {
        Ok((name, Ok(()))) => info!(stream = %name, "Stream stopped"),
        Ok((name, Err(e))) =>
            error!(stream = %name, error = %e, "Stream failed, its quotes are no longer updated"),
        Err(e) => error!(error = %e, "Stream task aborted"),
    }
}
