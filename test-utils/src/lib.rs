//! `test-utils` is used for testing in both `ssadmin-lib` and `ssadmin-bin`.
//! This crate does not depend on `ssadmin-lib` or `ssadmin-bin`, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the dependencies.

/// Create a mock API server, which responds with a predefined status when
/// handling a request with a matching method and path
#[macro_export]
macro_rules! mock_api {
    ($method:expr, $path:expr, $status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new(http::StatusCode::from($status));
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::method($method))
            .and(wiremock::matchers::path($path))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        mock_server
    }};
}

/// Build a list of call-site frames, innermost first, from
/// `(file, function)` pairs
///
/// Expects `Frame` to be in scope.
#[macro_export]
macro_rules! frames {
    ($(($file:expr, $function:expr)),* $(,)?) => {
        vec![$(Frame::new($file, $function)),*]
    };
}

/// Get the root path of the project.
#[macro_export]
macro_rules! root_path {
    () => {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .to_path_buf()
    };
}

/// Gets the "main" binary name (e.g. `ssadmin`)
#[macro_export]
macro_rules! main_command {
    () => {
        assert_cmd::Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .expect("Couldn't get cargo package name")
    };
}
