/**
 * =================================================================
 * APARATO: OPTIONS BLOCK MIRROR TEST
 * CLASIFICACIÓN: EVIDENCIA DE INIT
 * OBJETIVO: Certificar el bloque de 22 líneas del init y la re-emisión
 *           en dialecto de subida (RemoteAtt).
 * =================================================================
 */

use fleetsync_core_protocol::emit::{
    render_biodata_upload_line, render_command_line, render_init_options_block,
    render_user_upload_line,
};
use fleetsync_core_protocol::parser::parse_upload_body;
use fleetsync_core_protocol::records::UploadRecord;
use fleetsync_domain_models::{BiometricKind, BiometricTemplate, Device, DeviceStamps, User};
use std::collections::BTreeMap;

fn sample_device() -> Device {
    let now = chrono::Utc::now();
    Device {
        serial_number: "A01".to_string(),
        push_version: "2.4.1".to_string(),
        language: "69".to_string(),
        comm_key: None,
        firmware_version: None,
        ip_address: None,
        fingerprint_algorithm: None,
        face_algorithm: None,
        options: BTreeMap::new(),
        stamps: DeviceStamps::default(),
        registered_at: now,
        last_seen: now,
    }
}

#[test]
fn certify_init_block_shape_and_defaults() {
    let block = render_init_options_block(&sample_device(), 0);

    assert!(block.starts_with("GET OPTION FROM: A01\n"));
    assert!(block.ends_with('\n'), "every line is LF-terminated");
    assert_eq!(block.lines().count(), 22, "init block carries 22 lines");

    for expected_line in [
        "ATTLOGStamp=None",
        "OPERLOGStamp=None",
        "ATTPHOTOStamp=None",
        "BIODATAStamp=None",
        "IDCARDStamp=None",
        "ERRORLOGStamp=None",
        "ErrorDelay=30",
        "Delay=10",
        "TransTimes=00:00;12:00",
        "TransInterval=1",
        "TransFlag=TransData EnrollUser ChgUser EnrollFP ChgFP FACE UserPic BioPhoto WORKCODE FVEIN",
        "TimeZone=0",
        "Realtime=1",
        "Encrypt=None",
        "ServerVer=2.4.1",
        "PushProtVer=2.4.1",
        "PushOptionsFlag=1",
        "PushOptions=FingerFunOn,FaceFunOn,MultiBioDataSupport,MultiBioPhotoSupport,BioPhotoFun,BioDataFun,VisilightFun",
        "MultiBioDataSupport=0:1:1:0:0:0:0:1:1:1",
        "MultiBioPhotoSupport=0:1:1:0:0:0:0:1:1:1",
        "ATTPHOTOBase64=1",
    ] {
        assert!(
            block.lines().any(|line| line == expected_line),
            "missing line: {}",
            expected_line
        );
    }
    println!("✅ INIT: Options block shape certified.");
}

#[test]
fn certify_confirmed_stamps_and_masks_are_emitted() {
    let mut device = sample_device();
    device.stamps.operlog = Some("9999".to_string());
    device.stamps.biodata = Some("1234".to_string());
    device
        .options
        .insert("MultiBioDataSupport".to_string(), "0:1:0:0:0:0:0:1:0:1".to_string());

    let block = render_init_options_block(&device, 8);
    assert!(block.contains("OPERLOGStamp=9999\n"));
    assert!(block.contains("BIODATAStamp=1234\n"));
    assert!(block.contains("IDCARDStamp=None\n"));
    assert!(block.contains("TimeZone=8\n"));
    assert!(block.contains("MultiBioDataSupport=0:1:0:0:0:0:0:1:0:1\n"));
    println!("✅ INIT: Confirmed stamps and masks certified.");
}

#[test]
fn certify_command_line_envelope() {
    let line = render_command_line("a1b2c3d4e5f60718", "DATA DELETE USERINFO PIN=7");
    assert_eq!(line, "C:a1b2c3d4e5f60718:DATA DELETE USERINFO PIN=7");
    println!("✅ INIT: Command line envelope certified.");
}

#[test]
fn certify_upload_dialect_round_trip() {
    // Invariante de fidelidad: lo que se re-emite en dialecto de subida
    // vuelve a parsear al mismo blob byte a byte.
    let user = User {
        pin: "7".to_string(),
        name: "Bruno".to_string(),
        privilege: 14,
        password: "pw".to_string(),
        card: "111".to_string(),
        group: "2".to_string(),
        time_zone: User::DEFAULT_TIME_ZONE.to_string(),
        verify_mode: 4,
        vice_card: "222".to_string(),
    };
    let user_line = render_user_upload_line(&user);
    match parse_upload_body(&user_line).remove(0).expect("round-trips") {
        UploadRecord::User(record) => {
            assert_eq!(record.to_user(), user);
        }
        other => panic!("unexpected variant: {:?}", other),
    }

    let template = BiometricTemplate {
        pin: "7".to_string(),
        kind: BiometricKind::VisibleLightFace,
        slot_number: 0,
        template_index: 2,
        valid: 1,
        duress: 0,
        major_version: "39".to_string(),
        minor_version: "7".to_string(),
        format_tag: "0".to_string(),
        template_blob: "VklTSUJMRQ==".to_string(),
    };
    let biodata_line = render_biodata_upload_line(&template);
    match parse_upload_body(&biodata_line).remove(0).expect("round-trips") {
        UploadRecord::Biometric(record) => {
            let rehydrated = record.to_template().expect("translates");
            assert_eq!(rehydrated, template);
            assert_eq!(rehydrated.template_blob, "VklTSUJMRQ==");
        }
        other => panic!("unexpected variant: {:?}", other),
    }
    println!("✅ INIT: Upload dialect round-trip certified.");
}
