//! Static pools the seeders sample from.

use chrono::NaiveTime;

pub const FIRST_NAMES: &[&str] = &[
    "Lucía", "Mateo", "Sofía", "Hugo", "Martina", "Daniel", "Valeria", "Pablo", "Elena",
    "Álvaro", "Carmen", "Javier", "Paula", "Diego", "Irene", "Sergio", "Marta", "Andrés",
    "Julia", "Raúl", "Noelia", "Adrián", "Clara", "Marcos",
];

pub const LAST_NAMES: &[&str] = &[
    "García", "Fernández", "González", "Rodríguez", "López", "Martínez", "Sánchez", "Pérez",
    "Gómez", "Martín", "Jiménez", "Ruiz", "Hernández", "Díaz", "Moreno", "Muñoz", "Álvarez",
    "Romero", "Navarro", "Torres",
];

pub const STREETS: &[&str] = &[
    "Calle Mayor", "Avenida de la Constitución", "Calle del Sol", "Paseo de la Castellana",
    "Calle Real", "Avenida de América", "Calle Luna", "Plaza España",
];

pub const SPECIALTIES: &[(&str, &str)] = &[
    ("CARD", "Cardiología"),
    ("DERM", "Dermatología"),
    ("PED", "Pediatría"),
    ("NEUR", "Neurología"),
    ("TRAU", "Traumatología"),
    ("PSIQ", "Psiquiatría"),
];

pub const PERMISSIONS: &[(&str, &str)] = &[
    ("admin_full", "Acceso total"),
    ("ver_usuarios", "Ver usuarios"),
    ("crear_usuarios", "Crear usuarios"),
    ("editar_usuarios", "Editar usuarios"),
];

pub const CHRONIC_CONDITIONS: &[&str] = &[
    "Diabetes tipo 2", "Hipertensión", "Asma", "Epilepsia", "Enfermedad celíaca",
    "Artritis reumatoide", "Parkinson", "Esclerosis múltiple", "Colesterol alto",
    "Migraña crónica",
];

pub const ALLERGIES: &[&str] = &[
    "Penicilina", "Lactosa", "Frutos secos", "Polen", "Mariscos", "Ácaros", "Gluten",
    "Pelo de gato", "Latex",
];

pub const MEDICATIONS: &[&str] = &[
    "Paracetamol", "Ibuprofeno", "Metformina", "Amlodipino", "Losartán", "Omeprazol",
    "Insulina", "Levotiroxina", "Atorvastatina",
];

pub const RELATIONSHIPS: &[&str] = &["Padre", "Madre", "Hermano", "Pareja", "Tío", "Amigo"];
pub const BLOOD_TYPES: &[&str] = &["A+", "A-", "B+", "B-", "O+", "O-", "AB+", "AB-"];

pub const COMPONENT_TYPES: &[(&str, &str)] = &[
    ("menu", "Elementos de navegación principal"),
    ("boton", "Botones de acción en formularios"),
    ("formulario", "Formularios completos de entrada de datos"),
    ("seccion", "Secciones de contenido en páginas"),
    ("reporte", "Reportes y visualizaciones de datos"),
    ("modal", "Ventanas modales y diálogos"),
];

/// (tipo, codigo, nombre, modulo, ruta, icono, orden)
pub type ComponentSeed = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
    &'static str,
    i32,
);

pub const UI_COMPONENTS: &[ComponentSeed] = &[
    ("menu", "menu_usuarios", "Gestión de Usuarios", "Administración", Some("/usuarios"), "users", 1),
    ("menu", "menu_medicos", "Gestión de Médicos", "Administración", Some("/medicos"), "user-md", 2),
    ("menu", "menu_pacientes", "Gestión de Pacientes", "Administración", Some("/pacientes"), "heart", 3),
    ("menu", "menu_especialidades", "Especialidades", "Administración", Some("/especialidades"), "stethoscope", 4),
    ("menu", "menu_agenda", "Agenda Médica", "Médicos", Some("/agenda"), "calendar", 5),
    ("menu", "menu_historias", "Historias Clínicas", "Médicos", Some("/historias"), "file-medical", 6),
    ("menu", "menu_reportes", "Reportes", "Administración", Some("/reportes"), "chart-bar", 7),
    ("boton", "btn_crear_usuario", "Crear Usuario", "Usuarios", None, "plus", 10),
    ("boton", "btn_editar_usuario", "Editar Usuario", "Usuarios", None, "edit", 11),
    ("boton", "btn_eliminar_usuario", "Eliminar Usuario", "Usuarios", None, "trash", 12),
    ("boton", "btn_exportar_usuario", "Exportar Usuarios", "Usuarios", None, "download", 13),
    ("boton", "btn_crear_medico", "Crear Médico", "Médicos", None, "plus", 20),
    ("boton", "btn_editar_medico", "Editar Médico", "Médicos", None, "edit", 21),
    ("boton", "btn_crear_cita", "Solicitar Cita", "Agenda", None, "calendar-plus", 30),
    ("boton", "btn_cancelar_cita", "Cancelar Cita", "Agenda", None, "calendar-times", 31),
    ("boton", "btn_confirmar_cita", "Confirmar Cita", "Agenda", None, "calendar-check", 32),
    ("formulario", "form_usuario_completo", "Formulario Completo Usuario", "Usuarios", None, "user-edit", 40),
    ("formulario", "form_medico_completo", "Formulario Completo Médico", "Médicos", None, "user-md", 41),
    ("formulario", "form_consulta_medica", "Formulario Consulta Médica", "Consultas", None, "notes-medical", 42),
    ("formulario", "form_historia_clinica", "Formulario Historia Clínica", "Historias", None, "file-medical-alt", 43),
    ("seccion", "seccion_datos_personales", "Datos Personales", "Perfil", None, "user-circle", 50),
    ("seccion", "seccion_datos_medicos", "Datos Médicos", "Perfil", None, "heartbeat", 51),
    ("seccion", "seccion_contacto_emergencia", "Contacto de Emergencia", "Perfil", None, "phone-alt", 52),
];

/// Components visible with `ver_usuarios`.
pub const VIEW_USERS_COMPONENTS: &[&str] = &["menu_usuarios", "seccion_datos_personales"];

/// Typical consultation blocks.
pub fn schedule_blocks() -> [(NaiveTime, NaiveTime); 4] {
    let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default();
    [(t(8), t(12)), (t(14), t(18)), (t(9), t(13)), (t(15), t(19))]
}

pub const APPOINTMENT_STATES: &[&str] = &["pendiente", "confirmada", "realizada"];

pub const APPOINTMENT_REASONS: &[&str] = &[
    "Consulta general", "Control rutinario", "Seguimiento tratamiento", "Chequeo anual",
    "Dolor persistente", "Segunda opinión",
];

pub fn symptoms_for(specialty_code: &str) -> &'static [&'static str] {
    match specialty_code {
        "CARD" => &["Dolor en el pecho", "Palpitaciones", "Falta de aire", "Mareos", "Hinchazón en piernas", "Presión arterial elevada"],
        "DERM" => &["Erupción cutánea", "Picazón", "Manchas en la piel", "Acné severo", "Caída de cabello", "Uñas quebradizas"],
        "PED" => &["Fiebre", "Tos persistente", "Dolor abdominal", "Vómitos", "Diarrea", "Falta de apetito"],
        "NEUR" => &["Dolor de cabeza intenso", "Mareos frecuentes", "Pérdida de memoria", "Temblores", "Problemas de visión", "Debilidad muscular"],
        "TRAU" => &["Dolor en articulaciones", "Hinchazón después de caída", "Limitación de movimiento", "Dolor lumbar", "Esguince de tobillo", "Fractura sospechada"],
        "PSIQ" => &["Ansiedad", "Insomnio", "Cambios de humor", "Estrés persistente", "Problemas de concentración", "Ataques de pánico"],
        _ => &["Malestar general", "Dolor", "Fiebre"],
    }
}

pub const DIAGNOSES: &[&str] = &[
    "Hipertensión arterial controlada", "Infección respiratoria alta", "Lumbalgia mecánica",
    "Síndrome metabólico", "Ansiedad generalizada", "Diabetes tipo 2 compensada",
    "Artrosis de rodilla", "Reflujo gastroesofágico", "Migraña crónica", "Dermatitis atópica",
    "Virus estacional", "Esguince grado I", "Contractura muscular", "Resfriado común",
];

pub const TREATMENTS: &[&str] = &[
    "Reposo y analgésicos. Control en 1 semana.",
    "Antibiótico por 7 días. Volver si no mejora.",
    "Terapia física 2 veces por semana durante 1 mes.",
    "Medicamento diario. Control mensual.",
    "Cambios en estilo de vida y dieta. Seguimiento en 3 meses.",
    "Medicamento tópico. Aplicar 2 veces al día.",
    "Ejercicios de rehabilitación en casa.",
    "Control estricto de signos vitales.",
    "Derivación a especialista para evaluación.",
];

pub const NOTES: &[&str] = &[
    "Paciente colaborador, refiere buena adherencia al tratamiento.",
    "Se explican signos de alarma y se entrega material informativo.",
    "Antecedentes familiares relevantes revisados.",
    "Se recomienda control de peso y actividad física moderada.",
    "Evolución estable desde la última visita.",
];

pub const AUDIT_ACTIONS: &[&str] = &[
    "Inicio de sesión exitoso", "Cierre de sesión", "Creación de nuevo usuario",
    "Actualización de perfil médico", "Registro de nueva consulta médica",
    "Solicitud de cita médica", "Cancelación de cita", "Exportación de reporte de pacientes",
    "Modificación de horario médico", "Acceso a historia clínica",
    "Actualización de datos personales", "Configuración del sistema",
];

pub const AUDIT_MODULES: &[&str] = &[
    "Autenticación", "Usuarios", "Médicos", "Pacientes", "Agenda", "Historias Clínicas",
    "Consultas", "Reportes", "Configuración",
];

pub const DOCUMENT_FILES: &[(&str, &[&str])] = &[
    ("receta", &["Receta_Control_Regular.pdf", "Prescripción_Medicamentos.pdf", "Tratamiento_Farmacológico.pdf"]),
    ("laboratorio", &["Hemograma_Completo.pdf", "Perfil_Bioquímico.pdf", "Análisis_Orina.pdf", "Niveles_Glucosa.pdf"]),
    ("imagen", &["Radiografía_Tórax.dcm", "Ecografía_Abdominal.dcm", "Tomografía_Cráneo.dcm", "Resonancia_Columna.dcm"]),
    ("consentimiento", &["Consentimiento_Procedimiento.pdf", "Autorización_Tratamiento.pdf", "Consentimiento_Cirugía.pdf"]),
    ("otro", &["Informe_Evolución.pdf", "Certificado_Medico.pdf", "Justificante_Ausencia.pdf"]),
];

/// (medicamento, dosis, frecuencia, duracion)
pub const MEDICINES: &[(&str, &str, &str, &str)] = &[
    ("Paracetamol 500mg", "1 comprimido", "Cada 8 horas", "5 días"),
    ("Ibuprofeno 600mg", "1 comprimido", "Cada 12 horas", "7 días"),
    ("Naproxeno 500mg", "1 comprimido", "Cada 12 horas", "5 días"),
    ("Amoxicilina 500mg", "1 cápsula", "Cada 8 horas", "7 días"),
    ("Azitromicina 500mg", "1 comprimido", "Una vez al día", "3 días"),
    ("Ciprofloxacino 500mg", "1 comprimido", "Cada 12 horas", "7 días"),
    ("Omeprazol 20mg", "1 cápsula", "Una vez al día", "30 días"),
    ("Domperidona 10mg", "1 comprimido", "Cada 8 horas", "7 días"),
    ("Losartán 50mg", "1 comprimido", "Una vez al día", "30 días"),
    ("Atorvastatina 20mg", "1 comprimido", "Una vez al día", "30 días"),
    ("Salbutamol inhalador", "2 inhalaciones", "Cada 6 horas", "15 días"),
    ("Montelukast 10mg", "1 comprimido", "Una vez al día", "30 días"),
    ("Sumatriptán 50mg", "1 comprimido", "Al inicio migraña", "6 comprimidos"),
    ("Gabapentina 300mg", "1 cápsula", "Cada 8 horas", "30 días"),
];

pub const DOSAGE_NOTES: &[&str] = &[
    "Tomar con alimentos", "No tomar con alcohol", "Completar el tratamiento completo",
    "Suspender si aparece erupción cutánea", "Tomar con un vaso de agua",
    "Evitar manejar maquinaria pesada", "No tomar con antiácidos",
    "Conservar en lugar fresco y seco",
];

pub const PROGRESS_NOTES: &[&str] = &[
    "Paciente evoluciona favorablemente", "Mejoría significativa de los síntomas",
    "Tratamiento efectivo, continuar igual", "Signos vitales dentro de parámetros normales",
    "Disminución del dolor reportado", "Incremento en movilidad",
    "Mejoría en parámetros de laboratorio",
];

pub const RECOMMENDATIONS: &[&str] = &[
    "Continuar tratamiento actual", "Control en 1 semana", "Realizar estudios de laboratorio",
    "Modificar dosis según tolerancia", "Iniciar terapia física", "Cambios en estilo de vida",
    "Seguir dieta específica", "Evitar esfuerzos físicos", "Reposo relativo",
    "Aumentar hidratación",
];

pub const PLATFORMS: &[&str] = &["android", "ios", "web"];

/// (codigo, nombre, descripcion, indicaciones, urgencia_default)
pub const EXAM_TYPES: &[(&str, &str, &str, &str, &str)] = &[
    ("HEMO", "Hemograma Completo", "Análisis de células sanguíneas: glóbulos rojos, blancos y plaquetas", "Ayuno de 8 horas recomendado", "Rutina"),
    ("GLUC", "Glucosa en Sangre", "Medición de niveles de glucosa en sangre", "Ayuno de 8-12 horas requerido", "Rutina"),
    ("COLEST", "Perfil Lipídico", "Análisis de colesterol total, HDL, LDL y triglicéridos", "Ayuno de 12 horas requerido", "Rutina"),
    ("TSH", "Hormona Estimulante de Tiroides", "Evaluación de función tiroidea", "No requiere ayuno", "Rutina"),
    ("RAD_TORAX", "Radiografía de Tórax", "Estudio imagenológico del tórax", "Remover objetos metálicos", "Urgente"),
    ("ECO_ABD", "Ecografía Abdominal", "Estudio ultrasonográfico de órganos abdominales", "Ayuno de 6 horas y vejiga llena", "Rutina"),
    ("UROCULT", "Urocultivo", "Cultivo de orina para detectar infecciones", "Primera orina de la mañana", "Urgente"),
    ("PCR", "Proteína C Reactiva", "Marcador de inflamación e infección", "No requiere ayuno", "Urgente"),
];

pub const URGENCIES: &[&str] = &["Rutina", "Urgente", "Emergencia"];
