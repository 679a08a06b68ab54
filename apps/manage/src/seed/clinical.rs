use std::collections::HashMap;

use anyhow::Result;
use chrono::{Duration, Local, NaiveTime, Timelike, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};
use tracing::{info, warn};

use doctor_cell::{weekday_name, Schedule, WEEKDAYS};
use shared_config::AppConfig;
use shared_database::{tables, Query};

use super::data::*;
use super::{id_of, ids, Seeder};

pub async fn run(config: &AppConfig) -> Result<()> {
    info!("Seeding UI components, schedules and clinical data");
    let mut seeder = Seeder::new(config);

    let type_ids = seed_component_types(&seeder).await?;
    let component_ids = seed_components(&seeder, &type_ids).await?;
    seed_permission_components(&seeder, &component_ids).await?;
    seed_schedules(&mut seeder).await?;
    seed_histories(&seeder).await?;
    seed_appointments(&mut seeder).await?;
    seed_consultations(&mut seeder).await?;
    seed_audit_log(&mut seeder).await?;

    info!("Clinical data seeded");
    Ok(())
}

async fn seed_component_types(seeder: &Seeder) -> Result<HashMap<&'static str, i64>> {
    let mut type_ids = HashMap::new();
    for (nombre, descripcion) in COMPONENT_TYPES {
        let (row, _) = seeder
            .get_or_create(
                tables::COMPONENT_TYPES,
                Query::new().eq("nombre", nombre),
                json!({ "nombre": nombre, "descripcion": descripcion }),
            )
            .await?;
        type_ids.insert(*nombre, id_of(&row)?);
    }
    info!("Component types ready: {}", type_ids.len());
    Ok(type_ids)
}

async fn seed_components(
    seeder: &Seeder,
    type_ids: &HashMap<&'static str, i64>,
) -> Result<HashMap<&'static str, i64>> {
    let mut component_ids = HashMap::new();
    for (tipo, codigo, nombre, modulo, ruta, icono, orden) in UI_COMPONENTS {
        let (row, _) = seeder
            .get_or_create(
                tables::UI_COMPONENTS,
                Query::new().eq("codigo_componente", codigo),
                json!({
                    "tipo_componente_id": type_ids.get(tipo),
                    "codigo_componente": codigo,
                    "nombre_componente": nombre,
                    "modulo": modulo,
                    "ruta": ruta,
                    "icono": icono,
                    "orden": orden,
                    "activo": true,
                }),
            )
            .await?;
        component_ids.insert(*codigo, id_of(&row)?);
    }
    info!("UI components ready: {}", component_ids.len());
    Ok(component_ids)
}

async fn permission_id(seeder: &Seeder, codigo: &str) -> Result<Option<i64>> {
    match seeder.find(tables::PERMISSIONS, Query::new().eq("codigo", codigo)).await? {
        Some(row) => Ok(Some(id_of(&row)?)),
        None => {
            warn!("Permission {} missing; run seed-users first", codigo);
            Ok(None)
        }
    }
}

async fn grant(seeder: &Seeder, permiso_id: i64, componente_id: i64, accion: &str) -> Result<bool> {
    let (_, created) = seeder
        .get_or_create(
            tables::PERMISSION_COMPONENTS,
            Query::new()
                .eq("permiso_id", permiso_id)
                .eq("componente_id", componente_id)
                .eq("accion_permitida", accion),
            json!({
                "permiso_id": permiso_id,
                "componente_id": componente_id,
                "accion_permitida": accion,
            }),
        )
        .await?;
    Ok(created)
}

async fn seed_permission_components(
    seeder: &Seeder,
    component_ids: &HashMap<&'static str, i64>,
) -> Result<()> {
    let mut granted = 0;
    if let Some(admin_full) = permission_id(seeder, "admin_full").await? {
        for componente_id in component_ids.values() {
            granted += grant(seeder, admin_full, *componente_id, "todos").await? as usize;
        }
    }
    if let Some(view_users) = permission_id(seeder, "ver_usuarios").await? {
        for codigo in VIEW_USERS_COMPONENTS {
            if let Some(componente_id) = component_ids.get(codigo) {
                granted += grant(seeder, view_users, *componente_id, "ver").await? as usize;
            }
        }
    }
    info!("Component grants created: {}", granted);
    Ok(())
}

fn hms(t: NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

async fn seed_schedules(seeder: &mut Seeder) -> Result<()> {
    let assignments = ids(&seeder.rows(tables::DOCTOR_SPECIALTIES, Query::new().select("id")).await?)?;
    if assignments.is_empty() {
        warn!("No doctor specialties found; run seed-users first");
        return Ok(());
    }

    // Sunday stays closed
    let working_days = &WEEKDAYS[..6];
    let blocks = schedule_blocks();
    let mut created = 0;

    for assignment_id in assignments {
        let count = seeder.rng.gen_range(3..=5);
        let days: Vec<&str> = working_days
            .choose_multiple(&mut seeder.rng, count)
            .copied()
            .collect();

        for dia in days {
            let (inicio, fin) = blocks[seeder.rng.gen_range(0..blocks.len())];
            let (_, was_created) = seeder
                .get_or_create(
                    tables::DOCTOR_SCHEDULES,
                    Query::new()
                        .eq("medico_especialidad_id", assignment_id)
                        .eq("dia_semana", dia)
                        .eq("hora_inicio", hms(inicio))
                        .eq("hora_fin", hms(fin)),
                    json!({
                        "medico_especialidad_id": assignment_id,
                        "dia_semana": dia,
                        "hora_inicio": hms(inicio),
                        "hora_fin": hms(fin),
                        "activo": true,
                    }),
                )
                .await?;
            created += was_created as usize;
        }
    }
    info!("Doctor schedules created: {}", created);
    Ok(())
}

async fn seed_histories(seeder: &Seeder) -> Result<()> {
    let patients = ids(&seeder.rows(tables::PATIENTS, Query::new().select("usuario_id")).await?)?;
    let mut created = 0;
    for paciente_id in patients {
        let (_, was_created) = seeder
            .get_or_create(
                tables::CLINICAL_HISTORIES,
                Query::new().eq("paciente_id", paciente_id).eq("activo", true),
                json!({
                    "paciente_id": paciente_id,
                    "fecha_creacion": Utc::now().to_rfc3339(),
                    "observaciones_generales": "Historia clínica abierta en el registro inicial.",
                    "activo": true,
                }),
            )
            .await?;
        created += was_created as usize;
    }
    info!("Clinical histories created: {}", created);
    Ok(())
}

async fn seed_appointments(seeder: &mut Seeder) -> Result<()> {
    let assignments = ids(
        &seeder
            .rows(tables::DOCTOR_SPECIALTIES, Query::new().select("id").order("id", true).limit(8))
            .await?,
    )?;
    let patients = ids(
        &seeder
            .rows(tables::PATIENTS, Query::new().select("usuario_id").order("usuario_id", true).limit(6))
            .await?,
    )?;
    if assignments.is_empty() || patients.is_empty() {
        warn!("Appointments need doctor specialties and patients; run seed-users first");
        return Ok(());
    }

    let today = Local::now().date_naive();
    let mut created = 0;

    for _ in 0..40 {
        let assignment_id = assignments[seeder.rng.gen_range(0..assignments.len())];
        let paciente_id = patients[seeder.rng.gen_range(0..patients.len())];
        let fecha = today + Duration::days(seeder.rng.gen_range(1..=15));

        let schedule: Option<Schedule> = seeder
            .db
            .select_one(
                tables::DOCTOR_SCHEDULES,
                &Query::new()
                    .eq("medico_especialidad_id", assignment_id)
                    .eq("dia_semana", weekday_name(fecha))
                    .eq("activo", true),
            )
            .await?;
        let Some(schedule) = schedule else { continue };

        let (start_hour, end_hour) = (schedule.hora_inicio.hour(), schedule.hora_fin.hour());
        if end_hour <= start_hour {
            continue;
        }
        let minute = if seeder.chance(0.5) { 0 } else { 30 };
        let Some(hora) = NaiveTime::from_hms_opt(seeder.rng.gen_range(start_hour..end_hour), minute, 0) else {
            continue;
        };

        let taken = seeder
            .db
            .exists(
                tables::APPOINTMENTS,
                &Query::new()
                    .eq("medico_especialidad_id", assignment_id)
                    .eq("fecha_cita", fecha)
                    .eq("hora_cita", hms(hora)),
            )
            .await?;
        if taken {
            continue;
        }

        let notas = if seeder.chance(0.5) { NOTES.choose(&mut seeder.rng).copied() } else { None };
        let row = json!({
            "paciente_id": paciente_id,
            "medico_especialidad_id": assignment_id,
            "fecha_cita": fecha,
            "hora_cita": hms(hora),
            "estado": APPOINTMENT_STATES.choose(&mut seeder.rng),
            "motivo": APPOINTMENT_REASONS.choose(&mut seeder.rng),
            "notas": notas,
            "fecha_creacion": Utc::now().to_rfc3339(),
        });
        seeder.insert(tables::APPOINTMENTS, row).await?;
        created += 1;
    }

    if created == 0 {
        warn!(
            assignments = assignments.len(),
            patients = patients.len(),
            "No appointments could be created; check that doctor schedules exist"
        );
    }
    info!("Sample appointments created: {}", created);
    Ok(())
}

async fn seed_consultations(seeder: &mut Seeder) -> Result<()> {
    let completed = seeder
        .rows(
            tables::APPOINTMENTS,
            Query::new()
                .select("id,paciente_id,fecha_cita,hora_cita,motivo,medico_especialidad:medico_especialidad(medico_id,especialidad:core_especialidad(codigo))")
                .eq("estado", "realizada"),
        )
        .await?;
    if completed.is_empty() {
        warn!("No completed appointments to build consultations from");
        return Ok(());
    }

    let mut created = 0;
    for cita in &completed {
        let Some(paciente_id) = cita["paciente_id"].as_i64() else { continue };
        let Some(medico_id) = cita["medico_especialidad"]["medico_id"].as_i64() else { continue };
        let codigo = cita["medico_especialidad"]["especialidad"]["codigo"]
            .as_str()
            .unwrap_or_default();
        let fecha_consulta = format!(
            "{}T{}",
            cita["fecha_cita"].as_str().unwrap_or_default(),
            cita["hora_cita"].as_str().unwrap_or("09:00:00")
        );

        let Some(history) = seeder
            .find(
                tables::CLINICAL_HISTORIES,
                Query::new().eq("paciente_id", paciente_id).eq("activo", true),
            )
            .await?
        else {
            continue;
        };
        let historia_id = id_of(&history)?;

        let exists = seeder
            .db
            .exists(
                tables::CONSULTATIONS,
                &Query::new()
                    .eq("historia_clinica_id", historia_id)
                    .eq("fecha_consulta", &fecha_consulta),
            )
            .await?;
        if exists {
            continue;
        }

        let symptoms = symptoms_for(codigo);
        let count = seeder.rng.gen_range(1..=3.min(symptoms.len()));
        let sintomas = symptoms
            .choose_multiple(&mut seeder.rng, count)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        let observaciones = if seeder.chance(0.7) { NOTES.choose(&mut seeder.rng).copied() } else { None };

        let row = json!({
            "historia_clinica_id": historia_id,
            "medico_id": medico_id,
            "fecha_consulta": fecha_consulta,
            "motivo_consulta": cita["motivo"].as_str().unwrap_or("Consulta general"),
            "sintomas": sintomas,
            "diagnostico": DIAGNOSES.choose(&mut seeder.rng),
            "tratamiento": TREATMENTS.choose(&mut seeder.rng),
            "observaciones": observaciones,
        });
        seeder.insert(tables::CONSULTATIONS, row).await?;
        created += 1;
    }
    info!("Consultations created: {}", created);
    Ok(())
}

async fn seed_audit_log(seeder: &mut Seeder) -> Result<()> {
    let users: Vec<Value> = seeder
        .rows(tables::USERS, Query::new().select("id").order("id", true).limit(5))
        .await?;
    let user_ids = ids(&users)?;
    if user_ids.is_empty() {
        warn!("No users found for audit rows");
        return Ok(());
    }

    for _ in 0..12 {
        let usuario_id = user_ids[seeder.rng.gen_range(0..user_ids.len())];
        let ip = format!(
            "192.168.{}.{}",
            seeder.rng.gen_range(0..=255),
            seeder.rng.gen_range(1..=254)
        );
        let fecha_hora = Utc::now()
            - Duration::days(seeder.rng.gen_range(0..=7))
            - Duration::hours(seeder.rng.gen_range(0..=23))
            - Duration::minutes(seeder.rng.gen_range(0..=59));
        let detalles = if seeder.chance(0.6) { NOTES.choose(&mut seeder.rng).copied() } else { None };

        let row = json!({
            "usuario_id": usuario_id,
            "ip_address": ip,
            "accion_realizada": AUDIT_ACTIONS.choose(&mut seeder.rng),
            "modulo_afectado": AUDIT_MODULES.choose(&mut seeder.rng),
            "fecha_hora": fecha_hora.to_rfc3339(),
            "detalles": detalles,
        });
        seeder.insert(tables::AUDIT_LOG, row).await?;
    }
    info!("Audit rows created: 12");
    Ok(())
}
