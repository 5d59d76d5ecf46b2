/// Generate a typed service method plus its `_with` variant taking [`CallOptions`].
///
/// The request expression may refer to the method's arguments. The fetched
/// envelope is converted to the return type; a mismatch surfaces as `Data`.
///
/// [`CallOptions`]: crate::CallOptions
#[macro_export]
macro_rules! mercato_router_method {
    (
        $(#[$meta:meta])*
        method: $name:ident( $( $arg:ident : $arg_ty:ty ),+ ) -> $ret:ty,
        with: $with_name:ident,
        request: $req:expr
    ) => {
        $(#[$meta])*
        ///
        /// # Errors
        /// Returns an error if no eligible provider succeeds or none support the data type.
        pub async fn $name(&self, $( $arg: $arg_ty ),+) -> Result<$ret, $crate::MercatoError> {
            self.$with_name($( $arg, )+ &$crate::CallOptions::new()).await
        }

        $(#[$meta])*
        ///
        /// Per-call deadline and follower wait come from `opts`.
        ///
        /// # Errors
        /// Returns an error if no eligible provider succeeds or none support the data type.
        pub async fn $with_name(
            &self,
            $( $arg: $arg_ty, )+
            opts: &$crate::CallOptions,
        ) -> Result<$ret, $crate::MercatoError> {
            let req: $crate::DataRequest = $req;
            let data = self.fetch(&req, opts).await?;
            <$ret>::try_from(data)
        }
    };
}
