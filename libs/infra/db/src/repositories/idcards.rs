// [libs/infra/db/src/repositories/idcards.rs]

use crate::errors::DbError;
use crate::TursoClient;
use chrono::Utc;
use fleetsync_domain_models::IdCardRecord;
use libsql::{params, Row};
use tracing::instrument;

/// Repositorio de cédulas de identidad, clave el número de documento.
pub struct IdCardRepository {
    database_client: TursoClient,
}

impl IdCardRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    const CARD_COLUMNS: &'static str = "id_number, pin, sn_number, dn, name, gender, nation, \
         birthday, valid_info, address, additional_info, issuer, photo_blob, \
         fingerprint_template_1, fingerprint_template_2, reserve, notice";

    fn map_row_to_card(data_row: &Row) -> Result<IdCardRecord, DbError> {
        Ok(IdCardRecord {
            id_number: data_row.get(0)?,
            pin: data_row.get(1)?,
            sn_number: data_row.get(2)?,
            dn: data_row.get(3)?,
            name: data_row.get(4)?,
            gender: data_row.get(5)?,
            nation: data_row.get(6)?,
            birthday: data_row.get(7)?,
            valid_info: data_row.get(8)?,
            address: data_row.get(9)?,
            additional_info: data_row.get(10)?,
            issuer: data_row.get(11)?,
            photo: data_row.get(12)?,
            fingerprint_template_1: data_row.get(13)?,
            fingerprint_template_2: data_row.get(14)?,
            reserve: data_row.get(15)?,
            notice: data_row.get(16)?,
        })
    }

    #[instrument(skip(self, card), fields(id_number = %card.id_number))]
    pub async fn upsert(&self, card: &IdCardRecord, source_serial: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT OR REPLACE INTO id_cards \
                 (id_number, pin, sn_number, dn, name, gender, nation, birthday, valid_info, \
                  address, additional_info, issuer, photo_blob, fingerprint_template_1, \
                  fingerprint_template_2, reserve, notice, source_serial, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                params![
                    card.id_number.clone(),
                    card.pin.clone(),
                    card.sn_number.clone(),
                    card.dn.clone(),
                    card.name.clone(),
                    card.gender.clone(),
                    card.nation.clone(),
                    card.birthday.clone(),
                    card.valid_info.clone(),
                    card.address.clone(),
                    card.additional_info.clone(),
                    card.issuer.clone(),
                    card.photo.clone(),
                    card.fingerprint_template_1.clone(),
                    card.fingerprint_template_2.clone(),
                    card.reserve.clone(),
                    card.notice.clone(),
                    source_serial,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn find(&self, id_number: &str) -> Result<Option<IdCardRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!("SELECT {} FROM id_cards WHERE id_number = ?1", Self::CARD_COLUMNS),
                params![id_number],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_row_to_card(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, id_number: &str) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        Ok(connection
            .execute("DELETE FROM id_cards WHERE id_number = ?1", params![id_number])
            .await?)
    }
}
