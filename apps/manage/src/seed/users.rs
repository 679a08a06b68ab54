use anyhow::Result;
use chrono::{Duration, Local};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;
use tracing::info;

use doctor_cell::models::DOCTOR_STATES;
use shared_config::AppConfig;
use shared_database::{tables, Query};
use shared_models::auth::{ROLE_ADMIN, ROLE_DOCTOR, ROLE_PATIENT};
use user_cell::models::CreateUserRequest;
use user_cell::{UserAccount, UserService};

use super::data::*;
use super::{id_of, ids, Seeder};

const ROLE_NAMES: [&str; 3] = [ROLE_ADMIN, ROLE_DOCTOR, ROLE_PATIENT];

pub async fn run(config: &AppConfig) -> Result<()> {
    info!("Seeding users, roles and profiles");
    let mut seeder = Seeder::new(config);
    let users = UserService::new(config);

    let role_ids = seed_roles(&seeder).await?;
    seed_administrators(&mut seeder, &users, role_ids[0]).await?;
    let specialty_ids = seed_specialties(&seeder).await?;
    seed_doctors(&mut seeder, &users, role_ids[1], &specialty_ids).await?;
    seed_patients(&mut seeder, &users, role_ids[2]).await?;

    info!("User data seeded");
    Ok(())
}

/// Returns role ids in `ROLE_NAMES` order. All catalog permissions go to the admin role.
async fn seed_roles(seeder: &Seeder) -> Result<Vec<i64>> {
    let mut role_ids = Vec::with_capacity(ROLE_NAMES.len());
    for name in ROLE_NAMES {
        let (role, _) = seeder
            .get_or_create(
                tables::ROLES,
                Query::new().eq("nombre_rol", name),
                json!({ "nombre_rol": name }),
            )
            .await?;
        role_ids.push(id_of(&role)?);
    }

    for (codigo, nombre) in PERMISSIONS {
        let (permission, _) = seeder
            .get_or_create(
                tables::PERMISSIONS,
                Query::new().eq("codigo", codigo),
                json!({ "codigo": codigo, "nombre": nombre }),
            )
            .await?;
        let permission_id = id_of(&permission)?;
        seeder
            .get_or_create(
                tables::ROLE_PERMISSIONS,
                Query::new().eq("rol_id", role_ids[0]).eq("permiso_id", permission_id),
                json!({ "rol_id": role_ids[0], "permiso_id": permission_id }),
            )
            .await?;
    }

    info!("Roles ready: {}", role_ids.len());
    Ok(role_ids)
}

fn random_name(seeder: &mut Seeder) -> (String, String) {
    let nombre = FIRST_NAMES.choose(&mut seeder.rng).copied().unwrap_or("Ana");
    let apellido = LAST_NAMES.choose(&mut seeder.rng).copied().unwrap_or("García");
    (nombre.to_string(), apellido.to_string())
}

fn random_phone(seeder: &mut Seeder) -> String {
    format!("6{:08}", seeder.rng.gen_range(0..100_000_000))
}

/// Creates the account unless the email is already registered.
async fn ensure_account(
    seeder: &mut Seeder,
    users: &UserService,
    email: &str,
    password: &str,
    role_id: i64,
    patient_details: bool,
) -> Result<Option<UserAccount>> {
    if users.find_by_email(email).await?.is_some() {
        return Ok(None);
    }

    let (nombre, apellido) = random_name(seeder);
    let (telefono, direccion, fecha_nacimiento, genero) = if patient_details {
        let street = STREETS.choose(&mut seeder.rng).copied().unwrap_or("Calle Mayor");
        let age_days = seeder.rng.gen_range(18 * 365..90 * 365);
        (
            Some(random_phone(seeder)),
            Some(format!("{} {}", street, seeder.rng.gen_range(1..200))),
            Some(Local::now().date_naive() - Duration::days(age_days)),
            ["M", "F"].choose(&mut seeder.rng).map(|g| g.to_string()),
        )
    } else {
        (None, None, None, None)
    };

    let account = users
        .create_user(CreateUserRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            nombre: Some(nombre),
            apellido: Some(apellido),
            telefono,
            direccion,
            fecha_nacimiento,
            genero,
            activo: Some(true),
            id_rol: Some(role_id),
        })
        .await?;
    Ok(Some(account))
}

async fn seed_administrators(seeder: &mut Seeder, users: &UserService, role_id: i64) -> Result<()> {
    for i in 1..=3 {
        let email = format!("admin{}@salud.com", i);
        if let Some(account) = ensure_account(seeder, users, &email, "admin12345", role_id, false).await? {
            seeder
                .insert(tables::ADMINISTRATORS, json!({ "usuario_id": account.id }))
                .await?;
        }
    }
    info!("Administrators ready");
    Ok(())
}

async fn seed_specialties(seeder: &Seeder) -> Result<Vec<i64>> {
    let mut specialty_ids = Vec::with_capacity(SPECIALTIES.len());
    for (codigo, nombre) in SPECIALTIES {
        let (row, _) = seeder
            .get_or_create(
                tables::SPECIALTIES,
                Query::new().eq("codigo", codigo),
                json!({
                    "codigo": codigo,
                    "nombre": nombre,
                    "descripcion": format!("Atención especializada en {}", nombre.to_lowercase()),
                }),
            )
            .await?;
        specialty_ids.push(id_of(&row)?);
    }
    info!("Specialties ready: {}", specialty_ids.len());
    Ok(specialty_ids)
}

async fn seed_doctors(
    seeder: &mut Seeder,
    users: &UserService,
    role_id: i64,
    specialty_ids: &[i64],
) -> Result<()> {
    let mut created = 0;
    for i in 1..=10 {
        let email = format!("medico{}@salud.com", i);
        let Some(account) = ensure_account(seeder, users, &email, "medico123", role_id, false).await? else {
            continue;
        };

        let estado = DOCTOR_STATES.choose(&mut seeder.rng).copied().unwrap_or("Activo");
        seeder
            .insert(
                tables::DOCTORS,
                json!({
                    "usuario_id": account.id,
                    "numero_licencia": format!("M-{}", 1000 + i),
                    "estado": estado,
                    "firma_digital": format!("Dr. {}", account.full_name()),
                }),
            )
            .await?;

        let count = seeder.rng.gen_range(1..=3);
        for especialidad_id in specialty_ids.choose_multiple(&mut seeder.rng, count) {
            seeder
                .insert(
                    tables::DOCTOR_SPECIALTIES,
                    json!({ "medico_id": account.id, "especialidad_id": especialidad_id }),
                )
                .await?;
        }
        created += 1;
    }

    let total = ids(&seeder.rows(tables::DOCTORS, Query::new().select("usuario_id")).await?)?;
    info!("Doctors created: {} (total {})", created, total.len());
    Ok(())
}

fn sample_list(seeder: &mut Seeder, pool: &[&str], max: usize) -> String {
    let count = seeder.rng.gen_range(0..=max);
    pool.choose_multiple(&mut seeder.rng, count)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

async fn seed_patients(seeder: &mut Seeder, users: &UserService, role_id: i64) -> Result<()> {
    let mut created = 0;
    for i in 1..=50 {
        let email = format!("paciente{}@salud.com", i);
        let Some(account) = ensure_account(seeder, users, &email, "paciente123", role_id, true).await? else {
            continue;
        };

        let (contact_first, contact_last) = random_name(seeder);
        let row = json!({
            "usuario_id": account.id,
            "tipo_sangre": BLOOD_TYPES.choose(&mut seeder.rng),
            "alergias": sample_list(seeder, ALLERGIES, 3),
            "enfermedades_cronicas": sample_list(seeder, CHRONIC_CONDITIONS, 2),
            "medicamentos_actuales": sample_list(seeder, MEDICATIONS, 2),
            "contacto_emergencia_nombre": format!("{} {}", contact_first, contact_last),
            "contacto_emergencia_telefono": random_phone(seeder),
            "contacto_emergencia_parentesco": RELATIONSHIPS.choose(&mut seeder.rng),
            "estado": "Activo",
        });
        seeder.insert(tables::PATIENTS, row).await?;
        created += 1;
    }
    info!("Patients created: {}", created);
    Ok(())
}
