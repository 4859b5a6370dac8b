// [libs/infra/db/src/repositories/photos.rs]
/*!
 * =================================================================
 * APARATO: PHOTO REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FOTOS DE USUARIO (PIN) Y COMPARATIVAS (PIN, TIPO)
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use chrono::Utc;
use fleetsync_domain_models::{ComparisonPhoto, UserPhoto};
use libsql::params;
use tracing::instrument;

pub struct PhotoRepository {
    database_client: TursoClient,
}

impl PhotoRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self, photo), fields(pin = %photo.pin))]
    pub async fn upsert_user_photo(
        &self,
        photo: &UserPhoto,
        source_serial: &str,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT OR REPLACE INTO user_photos \
                 (pin, file_name, declared_size, content_blob, source_serial, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    photo.pin.clone(),
                    photo.file_name.clone(),
                    photo.declared_size,
                    photo.content.clone(),
                    source_serial,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, photo), fields(pin = %photo.pin, kind = photo.kind_code))]
    pub async fn upsert_comparison_photo(
        &self,
        photo: &ComparisonPhoto,
        source_serial: &str,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT OR REPLACE INTO comparison_photos \
                 (pin, bio_type, file_name, declared_size, content_blob, source_serial, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    photo.pin.clone(),
                    photo.kind_code,
                    photo.file_name.clone(),
                    photo.declared_size,
                    photo.content.clone(),
                    source_serial,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn find_user_photo(&self, pin: &str) -> Result<Option<UserPhoto>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT pin, file_name, declared_size, content_blob \
                 FROM user_photos WHERE pin = ?1",
                params![pin],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(UserPhoto {
                pin: row.get(0)?,
                file_name: row.get(1)?,
                declared_size: row.get(2)?,
                content: row.get(3)?,
            })),
            None => Ok(None),
        }
    }

    pub async fn delete_user_photo(&self, pin: &str) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        Ok(connection
            .execute("DELETE FROM user_photos WHERE pin = ?1", params![pin])
            .await?)
    }
}
