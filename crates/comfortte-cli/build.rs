fn main() {
    // Embed version info when the target (not the host) is Windows
    let target = std::env::var( "CARGO_CFG_TARGET_OS" ).unwrap_or_default();
    if target != "windows" {
        return;
    }

    let mut res = winres::WindowsResource::new();

    // Cross-compiling from Linux needs the mingw resource compiler
    if std::env::var( "HOST" ).map( |h| !h.contains( "windows" ) ).unwrap_or( false ) {
        res.set_windres_path( "x86_64-w64-mingw32-windres" );
    }

    res.set( "ProductName", "ComfortTE" );
    res.set( "FileDescription", "ComfortTE desktop shell" );
    res.set( "OriginalFilename", "comfortte.exe" );
    if let Err( e ) = res.compile() {
        println!( "cargo:warning=Failed to compile Windows resources: {}", e );
    }
}
