/**
 * =================================================================
 * APARATO: WIRE PARSING MIRROR TEST
 * CLASIFICACIÓN: EVIDENCIA DE CÓDEC
 * OBJETIVO: Certificar el parseo de registros subidos, respuestas y
 *           reportes en ambas formas del protocolo.
 * =================================================================
 */

use fleetsync_core_protocol::parser::{
    parse_device_info_report, parse_options_list, parse_reply_body, parse_upload_body,
};
use fleetsync_core_protocol::records::UploadRecord;
use fleetsync_core_protocol::WireError;

#[test]
fn certify_user_record_parsing() {
    let upload_body = "USER PIN=1001\tName=Alice\tPri=0\tPasswd=\tCard=\tGrp=1\tTZ=0000000000000000\tVerify=-1\tViceCard=";
    let mut parsed = parse_upload_body(upload_body);
    assert_eq!(parsed.len(), 1);

    match parsed.remove(0).expect("USER record parses") {
        UploadRecord::User(user_record) => {
            assert_eq!(user_record.pin, "1001");
            assert_eq!(user_record.name, "Alice");
            assert_eq!(user_record.privilege, "0");
            assert_eq!(user_record.password, "");
            assert_eq!(user_record.group, "1");

            let user = user_record.to_user();
            assert_eq!(user.privilege, 0);
            assert_eq!(user.verify_mode, -1);
            assert_eq!(user.time_zone, "0000000000000000");
        }
        other => panic!("unexpected variant: {:?}", other),
    }
    println!("✅ CODEC: USER parsing certified.");
}

#[test]
fn certify_crlf_framing_and_empty_lines() {
    let upload_body = "USER PIN=1\tName=A\r\n\r\nUSER PIN=2\tName=B\n\nUSER PIN=3\tName=C";
    let parsed = parse_upload_body(upload_body);
    assert_eq!(parsed.len(), 3, "empty lines are dropped, CRLF tolerated");
    assert!(parsed.iter().all(|record| record.is_ok()));
    println!("✅ CODEC: CRLF/LF framing certified.");
}

#[test]
fn certify_key_case_per_tag_family() {
    // FP lleva PIN/Size/Valid; FACE lleva SIZE/VALID; FVEIN lleva Pin.
    let fingerprint = parse_upload_body("FP PIN=7\tFID=2\tSize=512\tValid=1\tTMP=QUJD")
        .remove(0)
        .expect("FP parses");
    match fingerprint {
        UploadRecord::Fingerprint(record) => {
            assert_eq!(record.pin, "7");
            assert_eq!(record.finger_id, "2");
            assert_eq!(record.size, "512");
            assert_eq!(record.template, "QUJD");
        }
        other => panic!("unexpected variant: {:?}", other),
    }

    let face = parse_upload_body("FACE PIN=7\tFID=0\tSIZE=1024\tVALID=1\tTMP=RkFDRQ==")
        .remove(0)
        .expect("FACE parses");
    match face {
        UploadRecord::Face(record) => {
            assert_eq!(record.size, "1024");
            assert_eq!(record.valid, "1");
        }
        other => panic!("unexpected variant: {:?}", other),
    }

    let vein = parse_upload_body("FVEIN Pin=7\tFID=1\tIndex=2\tSize=99\tValid=1\tTmp=VkVJTg==")
        .remove(0)
        .expect("FVEIN parses");
    match vein {
        UploadRecord::FingerVein(record) => {
            assert_eq!(record.pin, "7");
            assert_eq!(record.index, "2");
        }
        other => panic!("unexpected variant: {:?}", other),
    }
    println!("✅ CODEC: Per-family key casing certified.");
}

#[test]
fn certify_unknown_tag_and_missing_key_rejection() {
    let unknown = parse_upload_body("BOGUS PIN=1").remove(0);
    assert!(matches!(unknown, Err(WireError::UnknownTag(tag)) if tag == "BOGUS"));

    let missing_pin = parse_upload_body("USER Name=NoPin").remove(0);
    assert!(matches!(
        missing_pin,
        Err(WireError::MissingField { tag: "USER", field: "PIN" })
    ));
    println!("✅ CODEC: Unknown tag / missing key rejection certified.");
}

#[test]
fn certify_workcode_sms_and_idcard_parsing() {
    let work_code = parse_upload_body("WORKCODE PIN=9\tCODE=77\tNAME=Overtime")
        .remove(0)
        .expect("WORKCODE parses");
    assert_eq!(work_code.record_key(), "9:77");

    let message = parse_upload_body("SMS MSG=Hello\tTAG=1\tUID=42\tMIN=10\tStartTime=2026-08-01 10:00:00")
        .remove(0)
        .expect("SMS parses");
    assert_eq!(message.record_key(), "42");

    let link = parse_upload_body("USER_SMS PIN=9\tUID=42")
        .remove(0)
        .expect("USER_SMS parses");
    assert_eq!(link.record_key(), "9:42");

    let id_card = parse_upload_body(
        "IDCARD PIN=9\tSNNum=SN1\tIDNum=110101199001011234\tName=Wang\tGender=1\tBirthday=19900101\tFPTemplate1=QQ==",
    )
    .remove(0)
    .expect("IDCARD parses");
    match &id_card {
        UploadRecord::IdCard(card) => {
            assert_eq!(card.id_number, "110101199001011234");
            assert_eq!(card.fingerprint_template_1, "QQ==");
            assert_eq!(card.reserve, "", "absent keys surface as empty strings");
        }
        other => panic!("unexpected variant: {:?}", other),
    }
    assert_eq!(id_card.record_key(), "110101199001011234");
    println!("✅ CODEC: WORKCODE/SMS/IDCARD parsing certified.");
}

#[test]
fn certify_syncable_set_membership() {
    let syncable = parse_upload_body("USER PIN=1\tName=A").remove(0).expect("parses");
    assert!(syncable.is_syncable());

    let photo = parse_upload_body("USERPIC PIN=1\tFileName=1.jpg\tSize=4\tContent=QUJDRA==")
        .remove(0)
        .expect("parses");
    assert!(!photo.is_syncable(), "photos never enter the syncable set");

    let error_log = parse_upload_body("ERRORLOG ErrCode=-10\tErrMsg=pin missing\tDataOrigin=BIODATA")
        .remove(0)
        .expect("parses");
    assert!(!error_log.is_syncable());
    println!("✅ CODEC: Syncable set membership certified.");
}

#[test]
fn certify_reply_body_parsing() {
    let replies = parse_reply_body("ID=a1b2c3d4e5f60718&Return=0&CMD=DATA\r\nID=ffffffffffffffff&Return=-1003&CMD=DATA\n");
    assert_eq!(replies.len(), 2);

    let success = replies[0].as_ref().expect("first reply parses");
    assert_eq!(success.command_identifier, "a1b2c3d4e5f60718");
    assert!(success.is_success());
    assert_eq!(success.verb_tag, "DATA");

    let failure = replies[1].as_ref().expect("second reply parses");
    assert!(!failure.is_success());
    assert_eq!(failure.return_code_numeric(), Some(-1003));

    let missing_id = parse_reply_body("Return=0&CMD=DATA").remove(0);
    assert!(matches!(missing_id, Err(WireError::ReplyWithoutId)));
    println!("✅ CODEC: Reply parsing certified.");
}

#[test]
fn certify_info_report_and_options_list_parsing() {
    let report = parse_device_info_report("Ver 8.0.4.2,103,45,1200,192.168.1.20,10,7,12");
    assert_eq!(report.firmware_version.as_deref(), Some("Ver 8.0.4.2"));
    assert_eq!(report.user_count.as_deref(), Some("103"));
    assert_eq!(report.ip_address.as_deref(), Some("192.168.1.20"));
    assert_eq!(report.face_algorithm.as_deref(), Some("7"));

    let truncated = parse_device_info_report("Ver 8.0.4.2,103");
    assert_eq!(truncated.fingerprint_count, None);
    assert_eq!(truncated.ip_address, None);

    let options = parse_options_list("FingerFunOn=1,FaceFunOn=0,~DeviceName=F18");
    assert_eq!(options.get("FingerFunOn").map(String::as_str), Some("1"));
    assert_eq!(options.get("~DeviceName").map(String::as_str), Some("F18"));
    assert_eq!(options.len(), 3);
    println!("✅ CODEC: INFO report and options list certified.");
}
