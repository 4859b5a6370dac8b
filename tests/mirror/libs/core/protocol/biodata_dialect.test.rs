/**
 * =================================================================
 * APARATO: BIODATA DIALECT MIRROR TEST
 * CLASIFICACIÓN: EVIDENCIA DE CÓDEC
 * OBJETIVO: Certificar el doble parser BIODATA (tab y espacios) y la
 *           regla voraz del campo Tmp.
 * =================================================================
 */

use fleetsync_core_protocol::parser::parse_upload_body;
use fleetsync_core_protocol::records::UploadRecord;
use fleetsync_domain_models::BiometricKind;

fn parse_biodata(upload_line: &str) -> fleetsync_core_protocol::records::BiodataRecord {
    match parse_upload_body(upload_line).remove(0).expect("BIODATA parses") {
        UploadRecord::Biometric(record) => record,
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn certify_tab_separated_upload_form() {
    let record = parse_biodata(
        "BIODATA Pin=1001\tNo=3\tIndex=0\tValid=1\tDuress=0\tType=1\tMajorVer=12\tMinorVer=0\tFormat=ZK\tTmp=TUFOVA==",
    );
    assert_eq!(record.pin, "1001");
    assert_eq!(record.number, "3");
    assert_eq!(record.bio_type, "1");
    assert_eq!(record.format, "ZK");
    assert_eq!(record.template, "TUFOVA==");
    println!("✅ BIODATA: Tab-separated form certified.");
}

#[test]
fn certify_whitespace_fallback_form() {
    // Ciertos firmwares colapsan los tabs en tránsito: espacios simples y
    // múltiples mezclados deben recuperarse por extracción nominal.
    let record = parse_biodata(
        "BIODATA Pin=1001 No=3  Index=0 Valid=1   Duress=0 Type=7 MajorVer=12 MinorVer=0 Format=0 Tmp=VkVJTg==",
    );
    assert_eq!(record.pin, "1001");
    assert_eq!(record.number, "3");
    assert_eq!(record.index, "0");
    assert_eq!(record.bio_type, "7");
    assert_eq!(record.format, "0", "numeric Format passes through untouched");
    assert_eq!(record.template, "VkVJTg==");
    println!("✅ BIODATA: Whitespace fallback form certified.");
}

#[test]
fn certify_tmp_greedy_to_end_of_line() {
    // Tmp captura hasta el final de la línea aunque el blob contenga
    // espacios introducidos por un transporte defectuoso.
    let record = parse_biodata(
        "BIODATA Pin=5 No=0 Index=0 Valid=1 Duress=0 Type=2 MajorVer=5 MinorVer=8 Format=ZK Tmp=QUJD REVG",
    );
    assert_eq!(record.template, "QUJD REVG");
    println!("✅ BIODATA: Greedy Tmp rule certified.");
}

#[test]
fn certify_unified_template_translation() {
    let record = parse_biodata(
        "BIODATA Pin=1001\tNo=3\tIndex=1\tValid=1\tDuress=1\tType=8\tMajorVer=58\tMinorVer=0\tFormat=ZK\tTmp=UEFMTQ==",
    );
    let template = record.to_template().expect("translates to canonical form");
    assert_eq!(template.kind, BiometricKind::Palm);
    assert_eq!(template.slot_number, 3);
    assert_eq!(template.template_index, 1);
    assert_eq!(template.duress, 1);
    assert_eq!(template.major_version, "58");
    assert_eq!(template.template_blob, "UEFMTQ==");
    println!("✅ BIODATA: Unified translation certified.");
}

#[test]
fn certify_type_outside_enumeration_is_rejected() {
    let record = parse_biodata(
        "BIODATA Pin=1001\tNo=0\tIndex=0\tValid=1\tDuress=0\tType=12\tMajorVer=0\tMinorVer=0\tFormat=ZK\tTmp=QQ==",
    );
    assert!(record.to_template().is_err(), "Type=12 is outside the enumeration");
    println!("✅ BIODATA: Enumeration guard certified.");
}

#[test]
fn certify_legacy_families_collapse_to_unified_types() {
    let fingerprint = match parse_upload_body("FP PIN=1\tFID=4\tSize=512\tValid=1\tTMP=Rk8=")
        .remove(0)
        .expect("FP parses")
    {
        UploadRecord::Fingerprint(record) => record.to_template().expect("translates"),
        other => panic!("unexpected variant: {:?}", other),
    };
    assert_eq!(fingerprint.kind, BiometricKind::Fingerprint);
    assert_eq!(fingerprint.slot_number, 4);
    assert_eq!(fingerprint.format_tag, "ZK");

    let face = match parse_upload_body("FACE PIN=1\tFID=0\tSIZE=9\tVALID=1\tTMP=RkFDRQ==")
        .remove(0)
        .expect("FACE parses")
    {
        UploadRecord::Face(record) => record.to_template().expect("translates"),
        other => panic!("unexpected variant: {:?}", other),
    };
    assert_eq!(face.kind, BiometricKind::Face);
    assert_eq!(face.slot_number, 0);

    let vein = match parse_upload_body("FVEIN Pin=1\tFID=2\tIndex=1\tSize=9\tValid=1\tTmp=Vk4=")
        .remove(0)
        .expect("FVEIN parses")
    {
        UploadRecord::FingerVein(record) => record.to_template().expect("translates"),
        other => panic!("unexpected variant: {:?}", other),
    };
    assert_eq!(vein.kind, BiometricKind::FingerVein);
    assert_eq!(vein.template_index, 1);
    println!("✅ BIODATA: Legacy family collapse certified.");
}
