pub fn init() {
    etlcat_test_utils::init_tracing();
}
