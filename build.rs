// Build script for the click engine
//
// Oboe is a C++ library; Android builds must link against libc++_shared so
// symbols like __cxa_pure_virtual resolve correctly on all ABIs (arm/x86).

fn main() {
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("android") {
        println!("cargo:rustc-link-lib=c++_shared");
    }
}
