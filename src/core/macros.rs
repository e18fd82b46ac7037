#[macro_export]
#[doc(hidden)]
macro_rules! dbg_println {
    ($($arg:tt)*) => {{
        use std::io::Write;

        if $crate::core::dbg_println_enabled() {
            let mut f = $crate::core::get_log_file().lock();
            let _ = writeln!(f, "[{}] {}:{} ", $crate::core::elapsed_ms(), file!(), line!());
            let _ = writeln!(f, $($arg)*);
        }
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! trace_block {
    ($trace_label:expr, $($arg:tt)*) => {

        $crate::dbg_println!("{} START", $trace_label);

        let now = std::time::SystemTime::now();

        $($arg)*

        $crate::dbg_println!("{} END", $trace_label);

        if $crate::core::dbg_println_enabled() {
            let ms = now.elapsed().map(|d| d.as_millis()).unwrap_or(0);
            eprintln!("-- trace_block [{} ms] {} ({}:{}) ", ms, $trace_label, file!(), line!());
        }

    };
}
