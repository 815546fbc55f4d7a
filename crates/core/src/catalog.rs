//! Fixed option lists the forms choose from.

pub const DEFAULT_COURSES: &[&str] = &[
    "IA profesionales inmobiliarios",
    "IA educación básica",
    "IA educación universitaria",
    "IA empresas",
    "IA para gobierno",
    "Inglés",
    "Polivirtual Bach.",
    "Polivirtual Lic.",
];

pub const DEFAULT_CHANNELS: &[&str] = &[
    "WhatsApp",
    "Teléfono",
    "Correo",
    "Facebook",
    "Instagram",
    "Google",
    "Referido",
    "Otro",
];

pub const DEFAULT_GENDERS: &[&str] = &["Mujer", "Hombre", "No binario", "Prefiero no decir", "Otro"];

pub const DEFAULT_MESSAGE_STATUSES: &[&str] = &["Enviado", "Sin respuesta", "Respondido", "Perdido"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub courses: Vec<String>,
    pub channels: Vec<String>,
    pub genders: Vec<String>,
    pub message_statuses: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            courses: to_owned(DEFAULT_COURSES),
            channels: to_owned(DEFAULT_CHANNELS),
            genders: to_owned(DEFAULT_GENDERS),
            message_statuses: to_owned(DEFAULT_MESSAGE_STATUSES),
        }
    }
}

impl Catalog {
    pub fn has_course(&self, value: &str) -> bool {
        contains(&self.courses, value)
    }

    pub fn has_channel(&self, value: &str) -> bool {
        contains(&self.channels, value)
    }

    pub fn has_gender(&self, value: &str) -> bool {
        contains(&self.genders, value)
    }

    pub fn has_message_status(&self, value: &str) -> bool {
        contains(&self.message_statuses, value)
    }
}

pub fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn contains(options: &[String], value: &str) -> bool {
    let value = value.trim();
    options.iter().any(|option| option == value)
}
