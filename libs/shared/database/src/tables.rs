//! Table names of the clinic schema as exposed by PostgREST.

pub const USERS: &str = "core_usuario";
pub const ROLES: &str = "core_rol";
pub const PERMISSIONS: &str = "core_permiso";
pub const ROLE_PERMISSIONS: &str = "core_rol_permisos";
pub const ADMINISTRATORS: &str = "core_administrador";
pub const DOCTORS: &str = "core_medico";
pub const PATIENTS: &str = "core_paciente";
pub const SPECIALTIES: &str = "core_especialidad";
pub const DOCTOR_SPECIALTIES: &str = "medico_especialidad";
pub const DOCTOR_SCHEDULES: &str = "core_horariomedico";
pub const APPOINTMENTS: &str = "core_agendacita";
pub const CLINICAL_HISTORIES: &str = "core_historiaclinica";
pub const CONSULTATIONS: &str = "core_consulta";
pub const DOCUMENTS: &str = "core_documento";
pub const PRESCRIPTIONS: &str = "core_receta";
pub const PRESCRIPTION_ITEMS: &str = "core_detallereceta";
pub const FOLLOW_UPS: &str = "core_seguimiento";
pub const EXAM_TYPES: &str = "core_tipoexamen";
pub const EXAM_REQUESTS: &str = "core_solicitudexamen";
pub const NOTIFICATIONS: &str = "core_notificacion";
pub const DEVICES: &str = "core_dispositivo";
pub const BACKUPS: &str = "core_registrobackup";
pub const AUDIT_LOG: &str = "core_bitacora";
pub const COMPONENT_TYPES: &str = "core_tipocomponente";
pub const UI_COMPONENTS: &str = "core_componenteui";
pub const PERMISSION_COMPONENTS: &str = "core_permisocomponente";
pub const TOKEN_BLACKLIST: &str = "token_blacklist";
