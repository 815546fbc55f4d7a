//! Per-stage outreach message templates and chat deep links.

use crate::lead::{normalize_phone, Lead};
use crate::stage::Stage;

const WHATSAPP_SEND_URL: &str = "https://api.whatsapp.com/send";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTemplate {
    pub stage: Stage,
    pub kind: &'static str,
    pub channel: &'static str,
    /// Body with `{nombre}`, `{curso}`, `{fecha_limite}` and `{precio}` placeholders.
    pub body: &'static str,
}

pub fn template_for(stage: Stage) -> StageTemplate {
    let (kind, body) = match stage {
        Stage::Awareness => (
            "Bienvenida",
            "Hola {nombre}, gracias por tu interés en {curso}. ¿Te comparto información breve con temario, costo y fechas?",
        ),
        Stage::Contacted => (
            "Seguimiento inicial",
            "Hola {nombre}, ¿pudiste revisar la información de {curso}? Si te parece, te envío opciones de fechas y formas de pago.",
        ),
        Stage::Mql => (
            "Envío de información",
            "Te comparto temario y detalles de {curso} (duración, modalidad y costo). ¿Tienes alguna duda u objetivo específico?",
        ),
        Stage::Sql => (
            "Cierre suave",
            "Con lo que me comentaste, {curso} te ayudaría bastante. Para inscribirte, manejamos pago por transferencia o depósito. ¿Te envío los datos?",
        ),
        Stage::Nurturing => (
            "Contenido de valor",
            "Te dejo este material breve sobre {curso}. Tenemos grupo próximo; si te interesa, la fecha límite de inscripción es {fecha_limite}.",
        ),
        Stage::DemoBooked => (
            "Preinscripción/Depósito",
            "Para asegurar tu lugar en {curso}, realiza el depósito de preinscripción. Te comparto monto y datos; al confirmar, te envío acceso.",
        ),
        Stage::Won => (
            "Bienvenida alumno",
            "¡Bienvenido(a), {nombre}! Tu registro en {curso} quedó confirmado. En breve recibirás instrucciones y acceso.",
        ),
        Stage::Lost => (
            "Cierre cordial",
            "Gracias por tu tiempo, {nombre}. Si deseas retomar {curso} más adelante, con gusto te apoyamos con próximas fechas.",
        ),
        Stage::ReEngaged => (
            "Reactivación",
            "Tenemos nuevas fechas y opciones de {curso}. ¿Te comparto horarios y promociones vigentes?",
        ),
    };
    StageTemplate {
        stage,
        kind,
        channel: "WhatsApp",
        body,
    }
}

pub fn all_templates() -> Vec<StageTemplate> {
    Stage::ALL.into_iter().map(template_for).collect()
}

/// Fill the known placeholders from `lead`. Unknown placeholders are left as written.
pub fn render_template(body: &str, lead: &Lead, deadline: &str) -> String {
    body.replace("{nombre}", &lead.name)
        .replace("{curso}", &lead.course)
        .replace("{fecha_limite}", deadline)
        .replace("{precio}", &lead.estimated_amount)
}

/// Join several rendered previews into one outgoing message.
pub fn compose(previews: &[String]) -> String {
    previews
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Chat deep link for `message`, addressed to `phone` when it has digits.
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    let phone = normalize_phone(phone);
    let text = urlencoding::encode(message);
    if phone.is_empty() {
        format!("{WHATSAPP_SEND_URL}?text={text}")
    } else {
        format!("{WHATSAPP_SEND_URL}?phone={phone}&text={text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn every_stage_has_a_template() {
        let templates = all_templates();
        assert_eq!(templates.len(), Stage::ALL.len());
        assert!(templates.iter().all(|t| t.channel == "WhatsApp"));
    }

    #[test]
    fn render_fills_name_and_course() {
        let mut lead = testing::lead("1", "Ana");
        lead.course = "Inglés".to_string();
        let text = render_template(template_for(Stage::Won).body, &lead, "");
        assert_eq!(
            text,
            "¡Bienvenido(a), Ana! Tu registro en Inglés quedó confirmado. En breve recibirás instrucciones y acceso."
        );
    }

    #[test]
    fn unknown_placeholders_survive() {
        let lead = testing::lead("1", "Ana");
        assert_eq!(render_template("{nombre} {otro}", &lead, ""), "Ana {otro}");
    }

    #[test]
    fn compose_skips_blank_previews() {
        let previews = vec!["uno".to_string(), "  ".to_string(), "dos".to_string()];
        assert_eq!(compose(&previews), "uno\n\ndos");
    }

    #[test]
    fn link_encodes_message_and_phone() {
        assert_eq!(
            whatsapp_link("55 1234-5678", "Hola Ana & co"),
            "https://api.whatsapp.com/send?phone=5512345678&text=Hola%20Ana%20%26%20co"
        );
        assert_eq!(
            whatsapp_link("", "hi"),
            "https://api.whatsapp.com/send?text=hi"
        );
    }
}
