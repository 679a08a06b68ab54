use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{CreateDocumentRequest, Document, DocumentQuery, MedicalRecordError};

const NOT_FOUND: &str = "Documento no encontrado";

/// SHA-256 hex digest of base64 content; data URLs are accepted.
pub fn content_hash(contenido: &str) -> Result<String, MedicalRecordError> {
    let encoded = match contenido.split_once(";base64,") {
        Some((_, data)) => data,
        None => contenido,
    };
    let bytes = BASE64.decode(encoded.trim()).map_err(|e| {
        MedicalRecordError::Validation(format!("Contenido base64 inválido: {}", e))
    })?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

fn required(value: Option<String>, field: &str) -> Result<String, MedicalRecordError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MedicalRecordError::Validation(format!("El campo {} es obligatorio.", field)))
}

pub struct DocumentService {
    db: PostgrestClient,
}

impl DocumentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list(
        &self,
        query: DocumentQuery,
        owner: Option<i64>,
    ) -> Result<Vec<Document>, MedicalRecordError> {
        let mut q = Query::new();
        if let Some(paciente) = owner {
            q = q
                .select("*,historia_clinica:core_historiaclinica!inner(paciente_id)")
                .eq("historia_clinica.paciente_id", paciente);
        }
        if let Some(historia) = query.historia_clinica {
            q = q.eq("historia_clinica_id", historia);
        }
        if let Some(consulta) = query.consulta {
            q = q.eq("consulta_id", consulta);
        }
        if let Some(kind) = query.tipo_documento {
            q = q.eq("tipo_documento", kind.as_str());
        }
        let q = q
            .order("fecha_subida", false)
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::DOCUMENTS, &q).await?)
    }

    pub async fn get(&self, document_id: i64) -> Result<Document, MedicalRecordError> {
        let q = Query::new().eq("id", document_id);
        self.db
            .select_one(tables::DOCUMENTS, &q)
            .await?
            .ok_or(MedicalRecordError::NotFound(NOT_FOUND))
    }

    pub async fn create(&self, request: CreateDocumentRequest) -> Result<Document, MedicalRecordError> {
        let nombre_archivo = required(request.nombre_archivo, "nombre_archivo")?;
        let url_archivo = required(request.url_archivo, "url_archivo")?;
        let hash_archivo = match request.contenido.as_deref() {
            Some(contenido) => Some(content_hash(contenido)?),
            None => None,
        };

        let history = Query::new().eq("id", request.historia_clinica);
        if !self.db.exists(tables::CLINICAL_HISTORIES, &history).await? {
            return Err(MedicalRecordError::NotFound("Historia clínica no encontrada"));
        }
        if let Some(consulta) = request.consulta {
            let q = Query::new()
                .eq("id", consulta)
                .eq("historia_clinica_id", request.historia_clinica);
            if !self.db.exists(tables::CONSULTATIONS, &q).await? {
                return Err(MedicalRecordError::Validation(
                    "La consulta no pertenece a la historia clínica indicada.".to_string(),
                ));
            }
        }

        let document: Document = self
            .db
            .insert(
                tables::DOCUMENTS,
                json!({
                    "historia_clinica_id": request.historia_clinica,
                    "consulta_id": request.consulta,
                    "tipo_documento": request.tipo_documento,
                    "nombre_archivo": nombre_archivo,
                    "url_archivo": url_archivo,
                    "hash_archivo": hash_archivo,
                    "fecha_subida": Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        debug!(document_id = document.id, "Document stored");
        Ok(document)
    }

    pub async fn delete(&self, document_id: i64) -> Result<(), MedicalRecordError> {
        let q = Query::new().eq("id", document_id);
        if !self.db.exists(tables::DOCUMENTS, &q).await? {
            return Err(MedicalRecordError::NotFound(NOT_FOUND));
        }
        self.db.delete(tables::DOCUMENTS, &q).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn hashes_plain_and_data_url_content_alike() {
        // "hola" in base64
        let plain = content_hash("aG9sYQ==").unwrap();
        let data_url = content_hash("data:application/pdf;base64,aG9sYQ==").unwrap();

        assert_eq!(
            plain,
            "b221d9dbb083a7f33428d7c2a3c3198ae925614d70210e28716ccaa7cd4ddb79"
        );
        assert_eq!(plain, data_url);
    }

    #[test]
    fn rejects_invalid_base64() {
        assert_matches!(
            content_hash("no es base64!"),
            Err(MedicalRecordError::Validation(_))
        );
    }
}
