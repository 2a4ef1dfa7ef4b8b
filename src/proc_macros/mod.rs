//! Crate not intended for direct use.
//! Use https://docs.rs/resumable instead.
#![allow(nonstandard_style, unused_imports)]

use ::core::{
    mem,
    ops::Not as _,
};
use ::proc_macro::{
    TokenStream,
};
use ::proc_macro2::{
    Span,
    TokenStream as TokenStream2,
};
use ::quote::{
    quote,
    ToTokens,
};
use ::syn::{*,
    parse::{Parse, ParseStream},
    Result, // Explicitly shadow it
};

mod utils;

mod kw {
    ::syn::custom_keyword!(resume);
}

/// Turns a function containing `yield_!` / `suspend_!` points into a
/// constructor of a `::resumable::Coroutine`.
///
/// See the `::resumable` documentation for the accepted parameters.
#[proc_macro_attribute] pub
fn coroutine_fn (
    attrs: TokenStream,
    input: TokenStream,
) -> TokenStream
{
    coroutine_impl(attrs.into(), input.into())
        .map(|ret| {
            #[cfg(feature = "verbose-expansions")] {
                utils::pretty_print_tokenstream(&ret);
            }
            ret
        })
        .unwrap_or_else(|err| {
            let mut errors =
                err .into_iter()
                    .map(|err| Error::new(
                        err.span(),
                        format_args!("`#[resumable::coroutine_fn]`: {}", err),
                    ))
            ;
            let mut err = errors.next().unwrap();
            errors.for_each(|cur| err.combine(cur));
            err.to_compile_error()
        })
        .into()
}

/// `yield(Out), resume(In)`, in any order, `resume` being optional;
/// or the `Out` shorthand.
struct Params {
    yield_type: Type,
    resume_type: Type,
}

impl Parse for Params {
    fn parse (input: ParseStream<'_>)
      -> Result<Params>
    {
        if input.peek(Token![yield]).not() && input.peek(kw::resume).not() {
            return Ok(Params {
                yield_type: input.parse()?,
                resume_type: parse_quote!( () ),
            });
        }
        let mut yield_type = None;
        let mut resume_type = None;
        while input.is_empty().not() {
            let lookahead = input.lookahead1();
            let (slot, span) = if lookahead.peek(Token![yield]) {
                let kw: Token![yield] = input.parse()?;
                (&mut yield_type, kw.span)
            } else if lookahead.peek(kw::resume) {
                let kw: kw::resume = input.parse()?;
                (&mut resume_type, kw.span)
            } else {
                return Err(lookahead.error());
            };
            let contents;
            ::syn::parenthesized!(contents in input);
            if slot.replace(contents.parse::<Type>()?).is_some() {
                return Err(Error::new(span, "duplicate parameter"));
            }
            if input.is_empty().not() {
                let _: Token![,] = input.parse()?;
            }
        }
        Ok(Params {
            yield_type: yield_type.ok_or_else(|| {
                input.error("missing `yield(...)` parameter")
            })?,
            resume_type: resume_type.unwrap_or_else(|| parse_quote!( () )),
        })
    }
}

fn coroutine_impl (
    params: TokenStream2,
    input: TokenStream2,
) -> Result<TokenStream2>
{
    let Params { yield_type, resume_type } = parse2(params)?;

    let mut function: ItemFn = parse2(input)?;
    let ItemFn {
        ref mut block,
        ref mut sig,
        ..
    } = function;

    if let Some(ref asyncness) = sig.asyncness {
        return Err(Error::new_spanned(
            asyncness,
            "`async fn`s cannot be turned into coroutines",
        ));
    }
    if let Some(receiver) = sig.receiver() {
        return Err(Error::new_spanned(
            receiver,
            "`self` receivers are not supported yet",
        ));
    }

    // The declared return type is the one of the body; the function itself
    // now returns the (unstarted) coroutine.
    let body_ret: Type = match mem::replace(
        &mut sig.output,
        parse_quote!(
            -> ::resumable::Coroutine<#resume_type, #yield_type>
        ),
    )
    {
        | ReturnType::Type(_, ty) => *ty,
        | ReturnType::Default => return Err(Error::new(
            sig.ident.span(),
            "missing return type, expected `-> Result<_, BoxError>`",
        )),
    };

    *block = parse_quote!({
        ::resumable::Coroutine::new(move |
            __co__: ::resumable::Co<#resume_type, #yield_type>,
        | -> #body_ret
        {
            #[allow(unused_macros)]
            macro_rules! yield_ {(
                $value:expr $(,)?
            ) => (
                __co__.yield_($value)
            )}

            #[allow(unused_macros)]
            macro_rules! suspend_ {() => (
                __co__.suspend()
            )}

            #block
        })
    });

    Ok(function.into_token_stream())
}
