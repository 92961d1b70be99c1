use renders_backend::config::JwtConfig;
use renders_backend::util::jwt::*;

fn create_test_jwt_utils() -> JwtTokenUtilsImpl {
    JwtTokenUtilsImpl::new(JwtConfig::default())
}

struct TestUser {
    id: String,
    phone: String,
    role: String,
}

impl TestUser {
    fn petitioner() -> Self {
        Self {
            id: "user123".to_string(),
            phone: "5512345678".to_string(),
            role: "PETITIONER".to_string(),
        }
    }

    fn validator() -> Self {
        Self {
            id: "val456".to_string(),
            phone: "5587654321".to_string(),
            role: "VALIDATOR".to_string(),
        }
    }
}

#[test]
fn test_jwt_utils_creation() {
    let jwt_utils = create_test_jwt_utils();
    assert!(!jwt_utils.jwt_config.jwt_secret.is_empty());
    assert!(jwt_utils.jwt_config.access_token_expiration > 0);
    assert!(jwt_utils.jwt_config.refresh_token_expiration > 0);
}

#[test]
fn test_token_type_as_str() {
    assert_eq!(TokenType::Access.as_str(), "access");
    assert_eq!(TokenType::Refresh.as_str(), "refresh");
}

#[test]
fn test_generate_access_token_success() {
    let jwt_utils = create_test_jwt_utils();
    let user = TestUser::petitioner();

    let token = jwt_utils
        .generate_access_token(&user.id, &user.phone, &user.role)
        .expect("access token");
    assert!(!token.is_empty());

    let claims = jwt_utils.validate_access_token(&token).expect("claims");
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.phone, user.phone);
    assert_eq!(claims.role, user.role);
    assert_eq!(claims.token_type, "access");
}

#[test]
fn test_refresh_token_is_not_an_access_token() {
    let jwt_utils = create_test_jwt_utils();
    let user = TestUser::validator();

    let refresh = jwt_utils
        .generate_refresh_token(&user.id, &user.phone, &user.role)
        .expect("refresh token");

    // Validating it as an access token must fail on token type
    let result = jwt_utils.validate_access_token(&refresh);
    assert!(matches!(result, Err(JwtError::InvalidTokenType { .. })));

    // But it validates as a refresh token
    let claims = jwt_utils.validate_refresh_token(&refresh).expect("claims");
    assert_eq!(claims.role, "VALIDATOR");
}

#[test]
fn test_generate_token_pair() {
    let jwt_utils = create_test_jwt_utils();
    let user = TestUser::petitioner();

    let pair = jwt_utils
        .generate_token_pair(&user.id, &user.phone, &user.role)
        .expect("token pair");
    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(
        pair.expires_in,
        jwt_utils.jwt_config.access_token_expiration * 60
    );
    assert!(jwt_utils.validate_access_token(&pair.access_token).is_ok());
    assert!(jwt_utils.validate_refresh_token(&pair.refresh_token).is_ok());
}

#[test]
fn test_extract_token_from_header() {
    let jwt_utils = create_test_jwt_utils();

    let token = jwt_utils
        .extract_token_from_header("Bearer abc.def.ghi")
        .expect("token");
    assert_eq!(token, "abc.def.ghi");

    assert!(jwt_utils.extract_token_from_header("abc.def.ghi").is_err());
    assert!(jwt_utils.extract_token_from_header("Bearer ").is_err());
}

#[test]
fn test_tampered_token_is_rejected() {
    let jwt_utils = create_test_jwt_utils();
    let user = TestUser::petitioner();

    let token = jwt_utils
        .generate_access_token(&user.id, &user.phone, &user.role)
        .expect("token");
    let tampered = format!("{}x", token);

    assert!(jwt_utils.validate_access_token(&tampered).is_err());
}
