// [apps/sync-server/src/sync/ingest.rs]
/*!
 * =================================================================
 * APARATO: INGEST PIPELINE
 * CLASIFICACIÓN: APPLICATION CORE (ESTRATO L1-APP)
 * RESPONSABILIDAD: DESPACHO POR TAG AL ALMACÉN Y ENTREGA AL FAN-OUT
 *
 * Cada registro parseado se enruta a su repositorio con atribución de
 * origen. El conjunto sincronizable pasa al fan-out; USERPIC/BIOPHOTO
 * solo cuando el interruptor de fotos está encendido; ERRORLOG se anota
 * en el rastro y no dispara nada más. Un registro inválido se descarta
 * con razón en el log y la subida sigue contando los aceptados.
 * =================================================================
 */

use crate::config::SyncConfig;
use crate::sync::fanout::FanOutSynchronizer;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::Utc;
use fleetsync_core_protocol::formatter::validate_biometric;
use fleetsync_core_protocol::parser::parse_upload_body;
use fleetsync_core_protocol::records::UploadRecord;
use fleetsync_domain_models::{SyncAction, SyncJournalEntry, SyncStatus};
use fleetsync_infra_db::repositories::{
    BiometricRepository, IdCardRepository, MessageRepository, PhotoRepository,
    SyncJournalRepository, UserRepository, WorkCodeRepository,
};
use fleetsync_infra_db::DbError;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Conteo de una subida procesada.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Registros persistidos; es el número que el terminal ve en `OK: <n>`.
    pub accepted: usize,
    /// Registros parseados pero descartados por validación.
    pub rejected: usize,
    /// Líneas ininterpretables a nivel de cable. Con al menos una, el
    /// endpoint responde 400 tras la ingesta parcial y el terminal
    /// re-sube el lote en su próximo ciclo (los upserts son idempotentes).
    pub malformed: usize,
}

enum RecordDisposition {
    Stored,
    Rejected(String),
}

pub struct IngestPipeline {
    user_repository: Arc<UserRepository>,
    biometric_repository: Arc<BiometricRepository>,
    photo_repository: Arc<PhotoRepository>,
    work_code_repository: Arc<WorkCodeRepository>,
    message_repository: Arc<MessageRepository>,
    id_card_repository: Arc<IdCardRepository>,
    sync_journal: Arc<SyncJournalRepository>,
    synchronizer: Arc<FanOutSynchronizer>,
    config: Arc<SyncConfig>,
}

impl IngestPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repository: Arc<UserRepository>,
        biometric_repository: Arc<BiometricRepository>,
        photo_repository: Arc<PhotoRepository>,
        work_code_repository: Arc<WorkCodeRepository>,
        message_repository: Arc<MessageRepository>,
        id_card_repository: Arc<IdCardRepository>,
        sync_journal: Arc<SyncJournalRepository>,
        synchronizer: Arc<FanOutSynchronizer>,
        config: Arc<SyncConfig>,
    ) -> Self {
        Self {
            user_repository,
            biometric_repository,
            photo_repository,
            work_code_repository,
            message_repository,
            id_card_repository,
            sync_journal,
            synchronizer,
            config,
        }
    }

    /// Contrasta el tamaño declarado de una foto con el contenido real;
    /// la discrepancia se anota pero no rechaza el registro.
    fn audit_photo_size(pin: &str, declared_size: i64, content: &str) {
        if declared_size <= 0 || content.is_empty() {
            return;
        }
        match BASE64_STANDARD.decode(content) {
            Ok(decoded_bytes) if decoded_bytes.len() as i64 != declared_size => {
                warn!(
                    "📷 [INGEST]: Photo for PIN [{}] declares {} bytes but decodes to {}.",
                    pin,
                    declared_size,
                    decoded_bytes.len()
                );
            }
            Ok(_) => {}
            Err(_) => {
                warn!("📷 [INGEST]: Photo content for PIN [{}] is not decodable base64.", pin);
            }
        }
    }

    fn should_propagate(&self, record: &UploadRecord) -> bool {
        match record {
            UploadRecord::UserPhoto(_) | UploadRecord::ComparisonPhoto(_) => {
                self.config.propagate_photos
            }
            _ => record.is_syncable(),
        }
    }

    /// Persiste una plantilla unificada tras validarla. Una plantilla que
    /// no valida se descarta aquí mismo: nunca entra al almacén.
    async fn store_template_record(
        &self,
        source_serial: &str,
        template_result: Result<fleetsync_domain_models::BiometricTemplate, fleetsync_core_protocol::WireError>,
    ) -> Result<RecordDisposition, DbError> {
        match template_result {
            Ok(template) => {
                if let Err(validation_fault) = validate_biometric(&template) {
                    return Ok(RecordDisposition::Rejected(validation_fault.to_string()));
                }
                self.biometric_repository
                    .upsert(&template, source_serial)
                    .await?;
                Ok(RecordDisposition::Stored)
            }
            Err(fault) => Ok(RecordDisposition::Rejected(fault.to_string())),
        }
    }

    async fn store_record(
        &self,
        source_serial: &str,
        record: &UploadRecord,
    ) -> Result<RecordDisposition, DbError> {
        match record {
            UploadRecord::User(user_record) => {
                self.user_repository
                    .upsert(&user_record.to_user(), source_serial)
                    .await?;
            }
            UploadRecord::Fingerprint(fingerprint_record) => {
                return self
                    .store_template_record(source_serial, fingerprint_record.to_template())
                    .await;
            }
            UploadRecord::Face(face_record) => {
                return self
                    .store_template_record(source_serial, face_record.to_template())
                    .await;
            }
            UploadRecord::FingerVein(vein_record) => {
                return self
                    .store_template_record(source_serial, vein_record.to_template())
                    .await;
            }
            UploadRecord::Biometric(biodata_record) => {
                return self
                    .store_template_record(source_serial, biodata_record.to_template())
                    .await;
            }
            UploadRecord::UserPhoto(photo_record) => match photo_record.to_photo() {
                Ok(photo) => {
                    Self::audit_photo_size(&photo.pin, photo.declared_size, &photo.content);
                    self.photo_repository
                        .upsert_user_photo(&photo, source_serial)
                        .await?
                }
                Err(fault) => return Ok(RecordDisposition::Rejected(fault.to_string())),
            },
            UploadRecord::ComparisonPhoto(photo_record) => match photo_record.to_photo() {
                Ok(photo) => {
                    Self::audit_photo_size(&photo.pin, photo.declared_size, &photo.content);
                    self.photo_repository
                        .upsert_comparison_photo(&photo, source_serial)
                        .await?
                }
                Err(fault) => return Ok(RecordDisposition::Rejected(fault.to_string())),
            },
            UploadRecord::WorkCode(work_code_record) => {
                self.work_code_repository
                    .upsert(&work_code_record.to_work_code(), source_serial)
                    .await?;
            }
            UploadRecord::ShortMessage(sms_record) => {
                self.message_repository
                    .upsert_message(&sms_record.to_message(), source_serial)
                    .await?;
            }
            UploadRecord::UserMessage(link_record) => {
                self.message_repository
                    .upsert_link(&link_record.to_link(), source_serial)
                    .await?;
            }
            UploadRecord::IdCard(card_record) => {
                self.id_card_repository
                    .upsert(card_record, source_serial)
                    .await?;
            }
            UploadRecord::ErrorLog(error_log) => {
                // Informativo: se anota en el rastro y no dispara nada más.
                self.sync_journal
                    .append(&SyncJournalEntry {
                        source_serial: source_serial.to_string(),
                        target_serial: String::new(),
                        record_type: "ERRORLOG".to_string(),
                        record_key: error_log.command_id.clone(),
                        action: SyncAction::Other(format!(
                            "{}:{}",
                            error_log.data_origin, error_log.error_message
                        )),
                        status: SyncStatus::Logged,
                        detail: Some(error_log.error_code.clone()),
                        created_at: Utc::now(),
                    })
                    .await?;
            }
        }
        Ok(RecordDisposition::Stored)
    }

    /// Procesa un cuerpo de subida multi-registro: persiste, contabiliza y
    /// entrega el conjunto sincronizable al fan-out.
    #[instrument(skip(self, upload_body), fields(source = %source_serial))]
    pub async fn process_upload(
        &self,
        source_serial: &str,
        upload_body: &str,
    ) -> Result<IngestOutcome, DbError> {
        let mut outcome = IngestOutcome::default();
        let mut records_to_propagate: Vec<UploadRecord> = Vec::new();

        for parse_result in parse_upload_body(upload_body) {
            match parse_result {
                Err(wire_fault) => {
                    outcome.malformed += 1;
                    warn!("🧾 [INGEST]: Record discarded at parse: {}", wire_fault);
                }
                Ok(record) => match self.store_record(source_serial, &record).await? {
                    RecordDisposition::Stored => {
                        outcome.accepted += 1;
                        if self.should_propagate(&record) {
                            records_to_propagate.push(record);
                        }
                    }
                    RecordDisposition::Rejected(reason) => {
                        outcome.rejected += 1;
                        warn!(
                            "🧾 [INGEST]: {} record from [{}] discarded: {}",
                            record.tag(),
                            source_serial,
                            reason
                        );
                        // El registro descartado igualmente viaja al fan-out:
                        // la traducción vuelve a fallar y cada par activo
                        // recibe su fila 'skipped' en el rastro.
                        if self.should_propagate(&record) {
                            records_to_propagate.push(record);
                        }
                    }
                },
            }
        }

        if !records_to_propagate.is_empty() {
            self.synchronizer
                .propagate_records(source_serial, &records_to_propagate)
                .await;
        }

        info!(
            "📥 [INGEST]: Upload from [{}] accepted {} / rejected {} / malformed {}.",
            source_serial, outcome.accepted, outcome.rejected, outcome.malformed
        );
        Ok(outcome)
    }
}
