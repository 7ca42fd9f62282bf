//! Configuration task
//!
//! Owns the configuration store, the filter relay board and the card slot.
//! Requests are taken from [`CONFIG_REQUEST`] one at a time, so a save,
//! favorite update, card transfer or reset never overlaps another.

use defmt::*;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C1;

use sdt_core::traits::{BandRelay, NoDisplay};
use sdt_core::{ConfigStore, StoreError};
use sdt_drivers::bpf::Mcp23017Bpf;
use sdt_hal::NoCard;
use sdt_hal_rp2040::eeprom::Rp2040Eeprom;

use crate::channels::{ConfigRequest, CONFIG_REQUEST};

pub type Store = ConfigStore<Rp2040Eeprom<'static>>;
pub type Relay = Mcp23017Bpf<I2c<'static, I2C1, Blocking>>;
/// No SD interface is wired yet; card requests report the card unavailable
pub type Volume = NoCard;

/// Config task - serializes every persistence operation
#[embassy_executor::task]
pub async fn config_task(mut store: Store, mut relay: Relay, mut card: Volume) {
    info!("Config task started");

    // Route the filters for the band restored from EEPROM
    relay.set_active_band(store.working().active_band());

    loop {
        let request = CONFIG_REQUEST.receive().await;
        debug!("Config request: {}", request);

        if let Err(e) = handle(&mut store, &mut relay, &mut card, request) {
            error!("Config request {} failed: {}", request, e);
        }
    }
}

fn handle(
    store: &mut Store,
    relay: &mut Relay,
    card: &mut Volume,
    request: ConfigRequest,
) -> Result<(), StoreError> {
    match request {
        ConfigRequest::Save => store.save(),
        ConfigRequest::SelectBand(band) => {
            store.select_band(band, relay);
            Ok(())
        }
        ConfigRequest::StoreFavorite(slot) => store.store_favorite(slot),
        ConfigRequest::RecallFavorite(slot) => {
            let band = store.recall_favorite(slot, relay)?;
            info!("Favorite {} on {}", slot, band);
            Ok(())
        }
        ConfigRequest::Dump => {
            let lines = store.dump();
            info!("Dumped {} config lines", lines);
            Ok(())
        }
        ConfigRequest::FactoryReset => {
            store.factory_reset()?;
            relay.set_active_band(store.working().active_band());
            Ok(())
        }
        ConfigRequest::ExportToCard => {
            let lines = store.export_to_card(card)?;
            info!("Exported {} config lines", lines);
            Ok(())
        }
        ConfigRequest::ImportFromCard => {
            let report = store.import_from_card(card, &mut NoDisplay)?;
            // Imported band may differ from the one the relays are set for
            relay.set_active_band(store.working().active_band());
            info!("Imported config: {}", report);
            Ok(())
        }
    }
}
