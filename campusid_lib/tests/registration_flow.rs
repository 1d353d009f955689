use std::sync::Arc;
use std::time::Duration;

use campusid_lib::imaging::{AlphaPassthrough, NoFaceDetector, Point};
use campusid_lib::types::IdType;
use campusid_lib::wizard::{EmergencyContact, PersonalInfo};
use campusid_lib::{
    CachedClient, CampusDirectory, Level, PhotoPipeline, PhotoSlot, RegistrationForm,
    SignaturePad, Wizard, WizardStep,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn portrait_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(240, 300, |x, y| {
        let dx = x as i32 - 120;
        let dy = y as i32 - 130;
        if dx * dx + dy * dy < 60 * 60 {
            Rgba([190, 150, 120, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

async fn filled_wizard(client: &CachedClient) -> Wizard {
    let campuses = Arc::new(CampusDirectory::embedded().unwrap());
    let locations = client.location_directory().await.unwrap();
    let mut form = RegistrationForm::new(campuses, locations);

    form.set_personal(PersonalInfo {
        id_number: "22-00456".to_string(),
        id_type: Some(IdType::Replacement),
        first_name: "Ana".to_string(),
        middle_name: None,
        last_name: "Reyes".to_string(),
        suffix: None,
        year_level: Some(2),
        section: Some("B".to_string()),
    });
    form.set_contact(EmergencyContact {
        first_name: Some("Jose".to_string()),
        middle_name: None,
        last_name: Some("Reyes".to_string()),
        relationship: Some("Father".to_string()),
        number: Some("09181234567".to_string()),
    });
    let academic = form.academic_mut();
    academic.select_campus("Main").unwrap();
    academic.select_college("CTE").unwrap();
    academic
        .select_program("Bachelor of Secondary Education")
        .unwrap();
    academic.select_major("Mathematics").unwrap();
    let address = form.address_mut();
    address.select_province("ABRA").unwrap();
    address.select_city("BANGUED").unwrap();
    address.select_barangay("AGTANGAO").unwrap();
    address.set_zip_code(Some("2800".to_string()));

    Wizard::new(form)
}

#[tokio::test]
async fn full_registration_against_backend() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ph-location.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("ph-location.json")))
        .mount(&mock_server)
        .await;
    for endpoint in [
        "/register/validate-step-one",
        "/register/validate-step-two",
        "/register",
    ] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = CachedClient::with_base_url(&mock_server.uri(), Duration::from_secs(60)).unwrap();
    let mut wizard = filled_wizard(&client).await;

    let outcome = wizard.advance(&client).await;
    assert!(outcome.advanced, "{:?}", outcome.notifications);
    assert_eq!(wizard.step(), WizardStep::MediaUpload);

    let mut slot = PhotoSlot::new(PhotoPipeline::new(
        Arc::new(AlphaPassthrough),
        Arc::new(NoFaceDetector),
    ));
    let note = wizard
        .form_mut()
        .prepare_picture(&mut slot, &portrait_png())
        .await;
    assert_eq!(note.level, Level::Success);
    assert_eq!(wizard.form().picture().unwrap().file_name, "22-00456.jpg");

    let mut pad = SignaturePad::default();
    pad.begin_stroke(Point::new(30.0, 80.0));
    pad.add_point(Point::new(150.0, 30.0));
    pad.add_point(Point::new(300.0, 90.0));
    pad.end_stroke();
    wizard.form_mut().capture_signature(&pad).unwrap();

    let outcome = wizard.advance(&client).await;
    assert!(outcome.advanced, "{:?}", outcome.notifications);

    let preview = wizard.preview();
    assert_eq!(preview.details.major.as_deref(), Some("Mathematics"));
    assert_eq!(preview.signature.as_deref(), Some("22-00456_signature.jpg"));

    let outcome = wizard.advance(&client).await;
    assert_eq!(outcome.step, WizardStep::Submitted);
    assert!(wizard.form().picture().is_none());
}

#[tokio::test]
async fn backend_rejection_surfaces_each_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ph-location.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("ph-location.json")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/register/validate-step-one"))
        .respond_with(ResponseTemplate::new(422).set_body_string(
            r#"{"message":"The given data was invalid.","errors":{"id_number":["The id number has already been taken."],"contact_number":["The contact number is invalid."]}}"#,
        ))
        .mount(&mock_server)
        .await;

    let client = CachedClient::with_base_url(&mock_server.uri(), Duration::from_secs(60)).unwrap();
    let mut wizard = filled_wizard(&client).await;
    let before = wizard.form().details();

    let outcome = wizard.advance(&client).await;
    assert!(!outcome.advanced);
    assert_eq!(outcome.step, WizardStep::PersonalInfo);
    assert_eq!(outcome.notifications.len(), 2);
    assert!(outcome.notifications.iter().all(|n| n.level == Level::Error));
    assert_eq!(wizard.form().details(), before);
}

#[tokio::test]
async fn unreachable_backend_gives_generic_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ph-location.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("ph-location.json")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/register/validate-step-one"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = CachedClient::with_base_url(&mock_server.uri(), Duration::from_secs(60)).unwrap();
    let mut wizard = filled_wizard(&client).await;
    let outcome = wizard.advance(&client).await;
    assert_eq!(outcome.notifications.len(), 1);
    assert_eq!(outcome.notifications[0].level, Level::Error);
    assert!(wizard.errors().is_empty());
}
