use anyhow::Result;
use chrono::{Duration, NaiveDateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_database::{tables, Query};

use super::data::*;
use super::{id_of, ids, Seeder};

const CONSULTATION_SELECT: &str =
    "id,historia_clinica_id,medico_id,fecha_consulta,diagnostico,historia_clinica:core_historiaclinica(paciente_id)";

pub async fn run(config: &AppConfig) -> Result<()> {
    info!("Seeding documents, prescriptions, notifications and exams");
    let mut seeder = Seeder::new(config);

    seed_documents(&mut seeder).await?;
    seed_prescriptions(&mut seeder).await?;
    seed_follow_ups(&mut seeder).await?;
    seed_notifications(&mut seeder).await?;
    seed_devices(&mut seeder).await?;
    seed_exam_types(&seeder).await?;
    seed_exam_requests(&mut seeder).await?;

    info!("Notification and document data seeded");
    Ok(())
}

async fn consultations(seeder: &Seeder, limit: i64, with_diagnosis: bool) -> Result<Vec<Value>> {
    let mut q = Query::new().select(CONSULTATION_SELECT).order("id", true).limit(limit);
    if with_diagnosis {
        q = q.not_null("diagnostico");
    }
    seeder.rows(tables::CONSULTATIONS, q).await
}

fn consultation_time(consulta: &Value) -> NaiveDateTime {
    consulta["fecha_consulta"]
        .as_str()
        .and_then(|raw| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.naive_utc())
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
                .ok()
        })
        .unwrap_or_else(|| Utc::now().naive_utc())
}

async fn seed_documents(seeder: &mut Seeder) -> Result<()> {
    let rows = consultations(seeder, 20, false).await?;
    if rows.is_empty() {
        warn!("No consultations to attach documents to");
        return Ok(());
    }

    let mut created = 0;
    for consulta in &rows {
        for _ in 0..seeder.rng.gen_range(1..=3) {
            let Some((tipo, files)) = DOCUMENT_FILES.choose(&mut seeder.rng).copied() else { continue };
            let nombre_archivo = files.choose(&mut seeder.rng).copied().unwrap_or("Documento.pdf");
            let subida = consultation_time(consulta) + Duration::hours(seeder.rng.gen_range(1..=24));

            let row = json!({
                "historia_clinica_id": consulta["historia_clinica_id"],
                "consulta_id": consulta["id"],
                "tipo_documento": tipo,
                "nombre_archivo": nombre_archivo,
                "url_archivo": format!("/media/documentos/{}", nombre_archivo),
                "hash_archivo": seeder.hex_digest(),
                "fecha_subida": subida.and_utc().to_rfc3339(),
            });
            seeder.insert(tables::DOCUMENTS, row).await?;
            created += 1;
        }
    }
    info!("Documents created: {}", created);
    Ok(())
}

async fn seed_prescriptions(seeder: &mut Seeder) -> Result<()> {
    let rows = consultations(seeder, 15, true).await?;
    if rows.is_empty() {
        warn!("No diagnosed consultations to prescribe for");
        return Ok(());
    }

    let mut items = 0;
    for consulta in &rows {
        let observaciones = if seeder.chance(0.5) { NOTES.choose(&mut seeder.rng).copied() } else { None };
        let receta = seeder
            .insert(
                tables::PRESCRIPTIONS,
                json!({
                    "consulta_id": consulta["id"],
                    "fecha_receta": consultation_time(consulta).date(),
                    "observaciones": observaciones,
                }),
            )
            .await?;
        let receta_id = id_of(&receta)?;

        let count = seeder.rng.gen_range(2..=4);
        let medicines: Vec<_> = MEDICINES.choose_multiple(&mut seeder.rng, count).copied().collect();
        for (medicamento, dosis, frecuencia, duracion) in medicines {
            let row = json!({
                "receta_id": receta_id,
                "medicamento": medicamento,
                "dosis": dosis,
                "frecuencia": frecuencia,
                "duracion": duracion,
                "indicaciones": DOSAGE_NOTES.choose(&mut seeder.rng),
            });
            seeder.insert(tables::PRESCRIPTION_ITEMS, row).await?;
            items += 1;
        }
    }
    info!("Prescriptions created: {} ({} items)", rows.len(), items);
    Ok(())
}

async fn seed_follow_ups(seeder: &mut Seeder) -> Result<()> {
    let rows = consultations(seeder, 10, false).await?;
    let mut created = 0;
    for consulta in &rows {
        let base = consultation_time(consulta).date();
        for week in 1..=seeder.rng.gen_range(1..=2) {
            let row = json!({
                "consulta_id": consulta["id"],
                "fecha_seguimiento": base + Duration::days(7 * week),
                "observaciones": PROGRESS_NOTES.choose(&mut seeder.rng),
                "recomendaciones": RECOMMENDATIONS.choose(&mut seeder.rng),
            });
            seeder.insert(tables::FOLLOW_UPS, row).await?;
            created += 1;
        }
    }
    info!("Follow-ups created: {}", created);
    Ok(())
}

async fn notify(seeder: &Seeder, usuario_id: i64, tipo: &str, titulo: &str, mensaje: String, leida: bool, datos: Value) -> Result<()> {
    seeder
        .insert(
            tables::NOTIFICATIONS,
            json!({
                "usuario_id": usuario_id,
                "tipo": tipo,
                "titulo": titulo,
                "mensaje": mensaje,
                "leida": leida,
                "fecha_envio": Utc::now().to_rfc3339(),
                "datos_adicionales": datos,
            }),
        )
        .await?;
    Ok(())
}

async fn seed_notifications(seeder: &mut Seeder) -> Result<()> {
    let citas = seeder
        .rows(
            tables::APPOINTMENTS,
            Query::new()
                .select("id,paciente_id,fecha_cita,hora_cita,medico_especialidad:medico_especialidad(medico:core_medico(usuario:core_usuario(nombre,apellido)))")
                .order("id", true)
                .limit(10),
        )
        .await?;
    for cita in &citas {
        let Some(paciente_id) = cita["paciente_id"].as_i64() else { continue };
        let usuario = &cita["medico_especialidad"]["medico"]["usuario"];
        let nombre = usuario["nombre"].as_str().unwrap_or_default();
        let medico = format!("{} {}", nombre, usuario["apellido"].as_str().unwrap_or_default());
        let fecha = cita["fecha_cita"]
            .as_str()
            .and_then(|raw| chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default();
        let hora = cita["hora_cita"].as_str().map(|h| h.chars().take(5).collect::<String>()).unwrap_or_default();

        let leida = seeder.chance(0.5);
        notify(
            seeder,
            paciente_id,
            "cita",
            "Recordatorio de Cita",
            format!("Tiene cita con Dr. {} el {} a las {}", nombre, fecha, hora),
            leida,
            json!({ "tipo": "cita", "cita_id": cita["id"].to_string(), "medico": medico, "fecha": fecha, "hora": hora }),
        )
        .await?;
    }

    let admins = ids(
        &seeder
            .rows(tables::ADMINISTRATORS, Query::new().select("usuario_id").order("usuario_id", true).limit(2))
            .await?,
    )?;
    for admin_id in admins {
        notify(
            seeder,
            admin_id,
            "sistema",
            "Mantenimiento Programado",
            "Se programó mantenimiento del sistema para el próximo sábado de 2:00 a 4:00 AM".to_string(),
            false,
            json!({ "tipo": "sistema" }),
        )
        .await?;
    }

    let patients = ids(
        &seeder
            .rows(tables::PATIENTS, Query::new().select("usuario_id").order("usuario_id", true).limit(4))
            .await?,
    )?;
    for paciente_id in patients {
        let leida = seeder.chance(0.5);
        notify(
            seeder,
            paciente_id,
            "resultado",
            "Resultados Disponibles",
            "Los resultados de sus últimos exámenes de laboratorio están disponibles".to_string(),
            leida,
            json!({ "tipo": "resultado" }),
        )
        .await?;
    }

    info!("Notifications created");
    Ok(())
}

async fn seed_devices(seeder: &mut Seeder) -> Result<()> {
    let users = ids(
        &seeder
            .rows(tables::USERS, Query::new().select("id").order("id", true).limit(6))
            .await?,
    )?;
    let mut created = 0;
    for usuario_id in users {
        if !seeder.chance(0.7) {
            continue;
        }
        let token: String = format!("fcm_token_{}_{}", usuario_id, seeder.hex_digest())
            .chars()
            .take(100)
            .collect();
        let row = json!({
            "usuario_id": usuario_id,
            "token_fcm": token,
            "plataforma": PLATFORMS.choose(&mut seeder.rng),
            "activo": seeder.chance(0.75),
            "fecha_registro": Utc::now().to_rfc3339(),
        });
        seeder.insert(tables::DEVICES, row).await?;
        created += 1;
    }
    info!("Devices created: {}", created);
    Ok(())
}

async fn seed_exam_types(seeder: &Seeder) -> Result<()> {
    for (codigo, nombre, descripcion, indicaciones, urgencia) in EXAM_TYPES {
        seeder
            .get_or_create(
                tables::EXAM_TYPES,
                Query::new().eq("codigo", codigo),
                json!({
                    "codigo": codigo,
                    "nombre": nombre,
                    "descripcion": descripcion,
                    "indicaciones": indicaciones,
                    "urgencia_default": urgencia,
                    "activo": true,
                }),
            )
            .await?;
    }
    info!("Exam types ready: {}", EXAM_TYPES.len());
    Ok(())
}

async fn seed_exam_requests(seeder: &mut Seeder) -> Result<()> {
    let rows = consultations(seeder, 8, false).await?;
    let exam_types = ids(
        &seeder
            .rows(tables::EXAM_TYPES, Query::new().select("id").eq("activo", true))
            .await?,
    )?;
    if rows.is_empty() || exam_types.is_empty() {
        warn!("Exam requests need consultations and exam types");
        return Ok(());
    }

    let mut created = 0;
    for consulta in &rows {
        if !seeder.chance(0.5) {
            continue;
        }
        let completed = seeder.chance(0.5);
        let solicitud = consultation_time(consulta);
        let indicaciones = if seeder.chance(0.7) { DOSAGE_NOTES.choose(&mut seeder.rng).copied() } else { None };
        let estado = if completed { "completado" } else { "solicitado" };
        let mut row = json!({
            "consulta_id": consulta["id"],
            "paciente_id": consulta["historia_clinica"]["paciente_id"],
            "medico_id": consulta["medico_id"],
            "tipo_examen_id": exam_types[seeder.rng.gen_range(0..exam_types.len())],
            "urgencia": URGENCIES.choose(&mut seeder.rng),
            "indicaciones_especificas": indicaciones,
            "estado": estado,
            "fecha_solicitud": solicitud.and_utc().to_rfc3339(),
        });
        if completed {
            let resultado = solicitud + Duration::days(seeder.rng.gen_range(1..=3));
            row["resultados"] = json!("Valores obtenidos registrados en el informe adjunto.");
            let observaciones = if seeder.chance(0.7) {
                "Resultados dentro de parámetros normales"
            } else {
                "Se recomienda seguimiento"
            };
            row["observaciones"] = json!(observaciones);
            row["fecha_resultado"] = json!(resultado.and_utc().to_rfc3339());
        }
        seeder.insert(tables::EXAM_REQUESTS, row).await?;
        created += 1;
    }
    info!("Exam requests created: {}", created);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consultation_time_accepts_offset_and_naive_timestamps() {
        let with_offset = json!({ "fecha_consulta": "2025-03-03T10:30:00+00:00" });
        let naive = json!({ "fecha_consulta": "2025-03-03T10:30:00" });
        let expected = NaiveDateTime::parse_from_str("2025-03-03T10:30:00", "%Y-%m-%dT%H:%M:%S").unwrap();

        assert_eq!(consultation_time(&with_offset), expected);
        assert_eq!(consultation_time(&naive), expected);
    }
}
