fn main() {
    // ESP-IDF environment is only needed for the device targets
    // (xtensa-esp32-espidf, riscv32imc-esp-espidf, ...); host builds skip it.
    let target = std::env::var("TARGET").unwrap_or_default();
    if target.ends_with("-espidf") {
        embuild::espidf::sysenv::output();
    }
}
