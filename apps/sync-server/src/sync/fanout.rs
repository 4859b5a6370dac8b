// [apps/sync-server/src/sync/fanout.rs]
/*!
 * =================================================================
 * APARATO: FAN-OUT SYNCHRONIZER
 * CLASIFICACIÓN: APPLICATION CORE (ESTRATO L1-APP)
 * RESPONSABILIDAD: TRADUCCIÓN AL DIALECTO DE SALIDA Y ENCOLADO POR PAR
 *
 * Toma la instantánea del conjunto activo excluyendo al origen, traduce
 * cada registro una sola vez (FP/FACE/FVEIN colapsan a BIODATA), valida
 * y encola un comando por (par x registro). Mejor esfuerzo: el fallo de
 * un par no detiene a los demás; el orden por par respeta el orden de
 * la subida. Nadie espera el acuse del par: eso llega por `devicecmd`.
 * =================================================================
 */

use crate::config::SyncConfig;
use chrono::Utc;
use fleetsync_core_protocol::formatter::{CommandFormatter, OutboundCommand};
use fleetsync_core_protocol::records::UploadRecord;
use fleetsync_domain_models::{SyncAction, SyncJournalEntry, SyncStatus};
use fleetsync_infra_db::repositories::{
    CommandQueueRepository, DeviceRepository, SyncJournalRepository,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Conteo agregado de un ciclo de fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutOutcome {
    pub queued: usize,
    pub skipped: usize,
}

/// Registro ya traducido al dialecto de salida, listo para replicar en
/// cada par. La traducción ocurre una sola vez por subida.
struct TranslatedRecord {
    record_type: &'static str,
    record_key: String,
    command: Result<OutboundCommand, String>,
}

pub struct FanOutSynchronizer {
    device_registry: Arc<DeviceRepository>,
    command_queue: Arc<CommandQueueRepository>,
    sync_journal: Arc<SyncJournalRepository>,
    config: Arc<SyncConfig>,
}

impl FanOutSynchronizer {
    pub fn new(
        device_registry: Arc<DeviceRepository>,
        command_queue: Arc<CommandQueueRepository>,
        sync_journal: Arc<SyncJournalRepository>,
        config: Arc<SyncConfig>,
    ) -> Self {
        Self {
            device_registry,
            command_queue,
            sync_journal,
            config,
        }
    }

    /// Traducción al dialecto de salida. Las familias biométricas legadas
    /// se unifican aquí: FP -> tipo 1, FACE -> tipo 2, FVEIN -> tipo 7.
    fn translate_record(&self, record: &UploadRecord) -> Result<OutboundCommand, String> {
        match record {
            UploadRecord::User(user_record) => {
                Ok(CommandFormatter::user_update(&user_record.to_user()))
            }
            UploadRecord::Fingerprint(fingerprint_record) => {
                let template = fingerprint_record
                    .to_template()
                    .map_err(|fault| fault.to_string())?;
                CommandFormatter::biometric_update(&template).map_err(|fault| fault.to_string())
            }
            UploadRecord::Face(face_record) => {
                let template = face_record.to_template().map_err(|fault| fault.to_string())?;
                CommandFormatter::biometric_update(&template).map_err(|fault| fault.to_string())
            }
            UploadRecord::FingerVein(vein_record) => {
                let template = vein_record.to_template().map_err(|fault| fault.to_string())?;
                CommandFormatter::biometric_update(&template).map_err(|fault| fault.to_string())
            }
            UploadRecord::Biometric(biodata_record) => {
                let template = biodata_record
                    .to_template()
                    .map_err(|fault| fault.to_string())?;
                CommandFormatter::biometric_update(&template).map_err(|fault| fault.to_string())
            }
            UploadRecord::WorkCode(work_code_record) => Ok(CommandFormatter::work_code_update(
                &work_code_record.to_work_code(),
            )),
            UploadRecord::ShortMessage(sms_record) => {
                Ok(CommandFormatter::message_update(&sms_record.to_message()))
            }
            UploadRecord::UserMessage(link_record) => {
                Ok(CommandFormatter::user_message_update(&link_record.to_link()))
            }
            UploadRecord::IdCard(card_record) => Ok(CommandFormatter::id_card_update(card_record)),
            UploadRecord::UserPhoto(photo_record) => {
                let photo = photo_record.to_photo().map_err(|fault| fault.to_string())?;
                Ok(CommandFormatter::user_photo_update(&photo))
            }
            UploadRecord::ComparisonPhoto(photo_record) => {
                let photo = photo_record.to_photo().map_err(|fault| fault.to_string())?;
                Ok(CommandFormatter::comparison_photo_update(&photo))
            }
            UploadRecord::ErrorLog(_) => {
                Err("ERRORLOG records are informational and never propagate".to_string())
            }
        }
    }

    async fn journal(
        &self,
        source_serial: &str,
        target_serial: &str,
        record_type: &str,
        record_key: &str,
        action: SyncAction,
        status: SyncStatus,
        detail: Option<String>,
    ) {
        let entry = SyncJournalEntry {
            source_serial: source_serial.to_string(),
            target_serial: target_serial.to_string(),
            record_type: record_type.to_string(),
            record_key: record_key.to_string(),
            action,
            status,
            detail,
            created_at: Utc::now(),
        };
        if let Err(journal_fault) = self.sync_journal.append(&entry).await {
            // El rastro es auditoría: su fallo no interrumpe la propagación.
            error!("⚠️ [FANOUT]: Journal append failed: {}", journal_fault);
        }
    }

    /// Propaga los registros de una subida hacia todos los pares activos.
    #[instrument(skip(self, records), fields(source = %source_serial, records = records.len()))]
    pub async fn propagate_records(
        &self,
        source_serial: &str,
        records: &[UploadRecord],
    ) -> FanOutOutcome {
        let mut outcome = FanOutOutcome::default();
        if records.is_empty() {
            return outcome;
        }

        let active_peers = match self
            .device_registry
            .active_peers(self.config.active_window_minutes, Some(source_serial))
            .await
        {
            Ok(peers) => peers,
            Err(registry_fault) => {
                error!("❌ [FANOUT]: Active-set snapshot failed: {}", registry_fault);
                return outcome;
            }
        };
        if active_peers.is_empty() {
            return outcome;
        }

        // Traducción única por registro; la validación decide 'skipped'.
        let translated_records: Vec<TranslatedRecord> = records
            .iter()
            .map(|record| TranslatedRecord {
                record_type: record.tag(),
                record_key: record.record_key(),
                command: self.translate_record(record),
            })
            .collect();

        for peer in &active_peers {
            // El encolado por par es secuencial: un par recibe USER antes
            // que sus plantillas, en el orden de la subida.
            for translated in &translated_records {
                match &translated.command {
                    Ok(outbound_command) => {
                        match self
                            .command_queue
                            .enqueue(&peer.serial_number, outbound_command)
                            .await
                        {
                            Ok(_) => {
                                outcome.queued += 1;
                                self.journal(
                                    source_serial,
                                    &peer.serial_number,
                                    translated.record_type,
                                    &translated.record_key,
                                    SyncAction::Sync,
                                    SyncStatus::Queued,
                                    None,
                                )
                                .await;
                            }
                            Err(enqueue_fault) => {
                                outcome.skipped += 1;
                                warn!(
                                    "⚠️ [FANOUT]: Enqueue to [{}] failed: {}",
                                    peer.serial_number, enqueue_fault
                                );
                                self.journal(
                                    source_serial,
                                    &peer.serial_number,
                                    translated.record_type,
                                    &translated.record_key,
                                    SyncAction::Sync,
                                    SyncStatus::Skipped,
                                    Some(enqueue_fault.to_string()),
                                )
                                .await;
                            }
                        }
                    }
                    Err(skip_reason) => {
                        outcome.skipped += 1;
                        self.journal(
                            source_serial,
                            &peer.serial_number,
                            translated.record_type,
                            &translated.record_key,
                            SyncAction::Sync,
                            SyncStatus::Skipped,
                            Some(skip_reason.clone()),
                        )
                        .await;
                    }
                }
            }
        }

        info!(
            "🔁 [FANOUT]: {} queued / {} skipped across {} peers.",
            outcome.queued,
            outcome.skipped,
            active_peers.len()
        );
        outcome
    }

    /// Propaga un comando de operador hacia todos los terminales activos
    /// (sin exclusión de origen). Usado por la superficie de gestión.
    #[instrument(skip(self, outbound_command))]
    pub async fn propagate_operator_command(
        &self,
        record_type: &str,
        record_key: &str,
        action: SyncAction,
        outbound_command: &OutboundCommand,
    ) -> FanOutOutcome {
        let mut outcome = FanOutOutcome::default();

        let active_devices = match self
            .device_registry
            .active_peers(self.config.active_window_minutes, None)
            .await
        {
            Ok(devices) => devices,
            Err(registry_fault) => {
                error!("❌ [FANOUT]: Active-set snapshot failed: {}", registry_fault);
                return outcome;
            }
        };

        for device in &active_devices {
            match self
                .command_queue
                .enqueue(&device.serial_number, outbound_command)
                .await
            {
                Ok(_) => {
                    outcome.queued += 1;
                    self.journal(
                        "",
                        &device.serial_number,
                        record_type,
                        record_key,
                        action.clone(),
                        SyncStatus::Queued,
                        None,
                    )
                    .await;
                }
                Err(enqueue_fault) => {
                    outcome.skipped += 1;
                    self.journal(
                        "",
                        &device.serial_number,
                        record_type,
                        record_key,
                        action.clone(),
                        SyncStatus::Skipped,
                        Some(enqueue_fault.to_string()),
                    )
                    .await;
                }
            }
        }
        outcome
    }
}
