fn main() {
    println!("cargo:rerun-if-env-changed=UARTPWM_CONFIG");

    // Only the device build needs the ESP-IDF environment; host builds
    // (tests, fuzzing) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
