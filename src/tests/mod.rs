//! Consolidated test modules.
//!
//! End-to-end service provider flows against a mocked IdP, plus shared test
//! helpers.

mod sso_flow;

/// Generate a self-signed X.509 certificate and private key for testing.
///
/// Returns (certificate_pem, private_key_pem).
#[cfg(feature = "x509")]
pub(crate) fn generate_test_certificate() -> (String, String) {
    use openssl::{
        asn1::Asn1Time,
        bn::BigNum,
        hash::MessageDigest,
        pkey::PKey,
        rsa::Rsa,
        x509::{X509Builder, X509NameBuilder},
    };

    let rsa = Rsa::generate(2048).unwrap();
    let private_key = PKey::from_rsa(rsa).unwrap();

    let mut x509_name = X509NameBuilder::new().unwrap();
    x509_name
        .append_entry_by_text("CN", "idp.example.com")
        .unwrap();
    let x509_name = x509_name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial_number = BigNum::from_u32(1).unwrap();
    builder
        .set_serial_number(&serial_number.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&x509_name).unwrap();
    builder.set_issuer_name(&x509_name).unwrap();
    builder.set_pubkey(&private_key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(&private_key, MessageDigest::sha256()).unwrap();

    let cert = builder.build();

    let cert_pem = String::from_utf8(cert.to_pem().unwrap()).unwrap();
    let key_pem = String::from_utf8(private_key.private_key_to_pem_pkcs8().unwrap()).unwrap();

    (cert_pem, key_pem)
}
