//! Client-facing messages. The reception front end shows these verbatim.

pub const LOGIN_FIELDS_REQUIRED: &str = "아이디와 비밀번호를 모두 입력해주세요.";
pub const INVALID_CREDENTIALS: &str = "아이디 또는 비밀번호가 올바르지 않습니다.";
pub const LOGIN_SUCCEEDED: &str = "성공적으로 로그인했습니다.";
pub const LOGIN_FAILED: &str = "로그인 처리 중 문제가 발생했습니다.";

pub const REGISTER_FIELDS_REQUIRED: &str = "모든 필드를 입력해주세요.";
pub const PASSWORD_MISMATCH: &str = "비밀번호가 일치하지 않습니다.";
pub const USERNAME_TAKEN: &str = "이미 존재하는 아이디입니다.";
pub const EMAIL_TAKEN: &str = "이미 등록된 이메일입니다.";
pub const REGISTER_SUCCEEDED: &str = "회원가입이 완료되었습니다. 로그인해주세요.";
pub const REGISTER_FAILED: &str = "회원가입 처리 중 문제가 발생했습니다.";

pub const LOGGED_OUT: &str = "로그아웃되었습니다.";

pub const SESSION_LOOKUP_FAILED: &str = "데이터베이스 오류가 발생했습니다.";
pub const DASHBOARD_LOAD_FAILED: &str = "대시보드 정보를 불러오지 못했습니다.";
