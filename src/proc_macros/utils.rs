use super::*;

/// Dumps the expansion of a `#[coroutine_fn] fn` to stdout, formatted by
/// `rustfmt` and colorized by `bat` when those are available.
#[cfg(feature = "verbose-expansions")]
pub(in crate)
fn pretty_print_tokenstream (
    code: &'_ TokenStream2,
)
{
    fn rustfmt (input: &'_ str)
      -> Option<String>
    {Some({
        let mut child =
            ::std::process::Command::new("rustfmt")
                .args(&["--edition", "2021"])
                .stdin(::std::process::Stdio::piped())
                .stdout(::std::process::Stdio::piped())
                .stderr(::std::process::Stdio::null())
                .spawn()
                .ok()?
        ;
        ::std::io::Write::write_all(
            &mut child.stdin.take()?,
            input.as_bytes(),
        ).ok()?;
        let mut stdout = String::new();
        ::std::io::Read::read_to_string(
            &mut child.stdout.take()?,
            &mut stdout,
        ).ok()?;
        if child.wait().ok()?.success().not() { return None; }
        stdout
    })}

    let code = code.to_string();
    let code = rustfmt(&code).unwrap_or(code);
    if  ::bat::PrettyPrinter::new()
            .input_from_bytes(code.as_ref())
            .language("rust")
            .true_color(false)
            .snip(true)
            .print()
            .is_err()
    {
        println!("{}", code);
    }
}
