use crate::models::{AddStudentResponse, NewStudent, NewStudentForm};

pub const OTHER_SCHOOLS: &str = "Aðrir skólar";
pub const ADD_STUDENT_FAILED: &str = "Villa við að bæta við nemanda";
const MISSING_PASSWORD: &str = "----";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudentFormError {
    #[error("Vinsamlegast sláðu inn nafn")]
    MissingName,

    #[error("Vinsamlegast veldu skóla")]
    MissingSchool,

    #[error("Vinsamlegast sláðu inn heiti skóla")]
    MissingCustomSchool,
}

/// Checks the form in the order a user fills it in and resolves the custom
/// school name when "Aðrir skólar" is picked.
pub fn validate(form: &NewStudentForm, center_id: &str) -> Result<NewStudent, StudentFormError> {
    let nafn = form.nafn.trim();
    if nafn.is_empty() {
        return Err(StudentFormError::MissingName);
    }

    let mut skoli = form.skoli.as_str();
    if skoli.is_empty() {
        return Err(StudentFormError::MissingSchool);
    }
    if skoli == OTHER_SCHOOLS {
        skoli = form.custom_skoli.trim();
        if skoli.is_empty() {
            return Err(StudentFormError::MissingCustomSchool);
        }
    }

    Ok(NewStudent {
        nafn: nafn.to_string(),
        skoli: skoli.to_string(),
        bekkur: form.bekkur.clone(),
        center_id: center_id.to_string(),
    })
}

/// `Ok(password)` on success, `Err(message)` for the user otherwise.
pub fn interpret(response: AddStudentResponse) -> Result<String, String> {
    if response.status != "success" {
        return Err(response
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| ADD_STUDENT_FAILED.to_string()));
    }

    let password = response
        .password
        .filter(|p| !p.is_empty())
        .or_else(|| response.student.and_then(|s| s.password))
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| MISSING_PASSWORD.to_string());
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentRecord;

    fn form(nafn: &str, skoli: &str, custom: &str) -> NewStudentForm {
        NewStudentForm {
            nafn: nafn.to_string(),
            skoli: skoli.to_string(),
            bekkur: "7".to_string(),
            custom_skoli: custom.to_string(),
            center_id: None,
        }
    }

    #[test]
    fn validation_order() {
        assert_eq!(validate(&form("  ", "", ""), "1"), Err(StudentFormError::MissingName));
        assert_eq!(validate(&form("Jón", "", ""), "1"), Err(StudentFormError::MissingSchool));
        assert_eq!(
            validate(&form("Jón", OTHER_SCHOOLS, " "), "1"),
            Err(StudentFormError::MissingCustomSchool)
        );
    }

    #[test]
    fn custom_school_replaces_selection() {
        let student = validate(&form(" Jón ", OTHER_SCHOOLS, " Landakotsskóli "), "3").unwrap();
        assert_eq!(student.nafn, "Jón");
        assert_eq!(student.skoli, "Landakotsskóli");
        assert_eq!(student.center_id, "3");
        assert_eq!(student.bekkur, "7");
    }

    #[test]
    fn password_falls_back_to_student_then_placeholder() {
        let nested = AddStudentResponse {
            status: "success".to_string(),
            student: Some(StudentRecord {
                nafn: None,
                password: Some("ab12".to_string()),
            }),
            ..Default::default()
        };
        assert_eq!(interpret(nested), Ok("ab12".to_string()));

        let bare = AddStudentResponse {
            status: "success".to_string(),
            ..Default::default()
        };
        assert_eq!(interpret(bare), Ok("----".to_string()));
    }

    #[test]
    fn failure_uses_backend_message_or_default() {
        let with_message = AddStudentResponse {
            status: "error".to_string(),
            message: Some("Nemandi er þegar til".to_string()),
            ..Default::default()
        };
        assert_eq!(interpret(with_message), Err("Nemandi er þegar til".to_string()));

        let bare = AddStudentResponse::default();
        assert_eq!(interpret(bare), Err(ADD_STUDENT_FAILED.to_string()));
    }
}
